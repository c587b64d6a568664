//! Query functions, one module per table group.

pub mod contributions;
pub mod dictionary;
pub mod jobs;
pub mod publishers;
pub mod settings;
pub mod tokens;
