//! Object lifecycle module
//!
//! Object creation and deletion, kept consistent with the handle table.

pub mod lifecycle;

pub use lifecycle::{create_directory, create_file, delete, CreatedObject};
