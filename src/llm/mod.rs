pub mod azure;
pub mod rate_limiter;
pub mod traits;

pub use azure::{AzureChatModel, AzureEndpoint};
pub use traits::LanguageModel;
