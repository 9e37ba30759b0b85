use chrono::NaiveDateTime;
use serenity::all::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};
use thiserror::Error;

use crate::syntax::{self, Directory};

/// Discord rejects embeds with more fields than this.
pub const MAX_FIELDS: usize = 25;

pub const DEFAULT_COLOR: u32 = 0x5865F2;
const BLANK: &str = "\u{200b}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a hex colour such as #303236")]
pub struct InvalidColor(pub String);

/// Parses `#RRGGBB`, `0xRRGGBB` or `0x#RRGGBB`.
pub fn parse_hex_color(input: &str) -> Result<u32, InvalidColor> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x#")
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix('#'))
        .ok_or_else(|| InvalidColor(input.to_string()))?;

    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(InvalidColor(input.to_string()));
    }

    u32::from_str_radix(digits, 16).map_err(|_| InvalidColor(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTemplate {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Presentation of an embed. Shown as written, never rendered as a template.
///
/// Author url and icon are only shown together with an author name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedStyle {
    pub color: Option<u32>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
    pub author_icon_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
}

/// Raw embed text as written by the user, before directives are resolved.
///
/// The description and field values are templates; the title and field names
/// are shown as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTemplate {
    pub title: String,
    pub description: String,
    pub fields: Vec<FieldTemplate>,
    pub style: EmbedStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmbed {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String, bool)>,
    pub style: EmbedStyle,
}

impl EmbedTemplate {
    pub fn new(title: String, description: String) -> Self {
        EmbedTemplate {
            title,
            description,
            fields: Vec::new(),
            style: EmbedStyle::default(),
        }
    }

    pub fn render<D: Directory + ?Sized>(&self, directory: &D) -> RenderedEmbed {
        RenderedEmbed {
            title: self.title.clone(),
            description: syntax::render(&self.description, directory),
            fields: self
                .fields
                .iter()
                .map(|field| {
                    (
                        field.name.clone(),
                        syntax::render(&field.value, directory),
                        field.inline,
                    )
                })
                .collect(),
            style: self.style.clone(),
        }
    }
}

impl RenderedEmbed {
    pub fn into_embed(self, updated_at: NaiveDateTime) -> CreateEmbed {
        // Discord rejects empty field values, an empty member list included
        let fields = self.fields.into_iter().map(|(name, value, inline)| {
            let value = if value.trim().is_empty() {
                BLANK.to_string()
            } else {
                value
            };
            (name, value, inline)
        });

        let style = self.style;
        let mut embed = CreateEmbed::new()
            .title(self.title)
            .fields(fields)
            .color(style.color.unwrap_or(DEFAULT_COLOR))
            .footer(CreateEmbedFooter::new(footer_text(updated_at)));
        if !self.description.trim().is_empty() {
            embed = embed.description(self.description);
        }
        if let Some(name) = style.author_name {
            let mut author = CreateEmbedAuthor::new(name);
            if let Some(url) = style.author_url {
                author = author.url(url);
            }
            if let Some(icon_url) = style.author_icon_url {
                author = author.icon_url(icon_url);
            }
            embed = embed.author(author);
        }
        if let Some(url) = style.thumbnail_url {
            embed = embed.thumbnail(url);
        }
        if let Some(url) = style.image_url {
            embed = embed.image(url);
        }
        embed
    }
}

pub fn footer_text(updated_at: NaiveDateTime) -> String {
    format!(
        "Last auto update: {}",
        updated_at.format("%d.%m.%Y - %H:%M:%S")
    )
}
