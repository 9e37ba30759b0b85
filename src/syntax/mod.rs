//! Template engine for embed text.
//!
//! Text may contain `{role NAME}`, `{member NAME#TAG}`, `{text_channel NAME}`,
//! `{voice_channel NAME}`, `{count_members EXPR}` and `{list_members EXPR}`
//! directives, where `EXPR` is a role expression such as `mods and staff not bots`.

mod directory;
pub mod expression;
mod guild;
mod scanner;

pub use directory::Directory;
pub use expression::{evaluate, ExpressionError, RoleExpression};
pub use guild::{member_tag, GuildSnapshot};
pub use scanner::{render, UNRESOLVED};
