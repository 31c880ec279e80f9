pub mod merge;
pub mod simplify;
pub mod suggest;
pub mod text;
pub mod tool_errors;
