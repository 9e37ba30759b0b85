pub mod config;
pub mod database;
pub mod embeds;
pub mod help;
pub mod syntax;

pub use config::Config;

pub struct Data {
    pub database: sqlx::PgPool,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
