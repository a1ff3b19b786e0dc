pub mod json;
pub mod text;

pub use json::{JsonConfig, JsonFormatter, JsonOutput, convert_to_json};
pub use text::{TextConfig, TextFormatter, format_question, join_blocks};
