// Core types: the captured module path and error modeling.
pub mod error;
pub mod module_path;
