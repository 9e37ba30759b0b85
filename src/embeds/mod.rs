pub mod commands;
pub mod handlers;
pub mod queries;
pub mod refresh;
pub mod template;

pub use template::{EmbedStyle, EmbedTemplate, FieldTemplate};
