//! Text tools: the demonstration string-processing tools.

pub mod count_words;
pub mod echo;
pub mod reverse;
pub mod uppercase;

pub use count_words::{CountWordsTool, WordCount};
pub use echo::EchoTool;
pub use reverse::ReverseTool;
pub use uppercase::UppercaseTool;
