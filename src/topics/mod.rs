// Topics: discovery, labelling, and the two scoring paths (term density and
// embedding similarity).

pub mod density;
pub mod discovery;
pub mod labels;
pub mod similarity;
pub mod topic;
pub mod traits;

pub use topic::{Topic, TopicSet};
