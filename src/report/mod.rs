//! Report assembly, validation and rendering.

pub mod assembler;
pub mod generator;
pub mod validator;

pub use assembler::assemble;
pub use generator::{generate_json_report, generate_markdown_report, write_report};
pub use validator::validate;
