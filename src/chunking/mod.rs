// Chunking strategies (greedy topic density, sentence windows, fixed word
// windows) plus the table and selection steps that consume their output.

pub mod density;
pub mod fixed;
pub mod select;
pub mod sentences;
pub mod table;
