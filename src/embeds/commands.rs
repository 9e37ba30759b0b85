use crate::embeds::queries::{
    clear_embed_for_guild, get_embed_for_guild, set_embed_for_guild, TrackedEmbed,
};
use crate::embeds::template::{
    parse_hex_color, EmbedStyle, EmbedTemplate, FieldTemplate, MAX_FIELDS,
};
use crate::syntax::{self, GuildSnapshot};
use crate::{Context, Error};

use poise::serenity_prelude as serenity;
use poise::CreateReply;

/// Replies are only shown to the invoking moderator.
fn private_reply(content: String) -> CreateReply {
    CreateReply::default().content(content).ephemeral(true)
}

async fn err_say(ctx: &Context<'_>, message: &str) -> Result<(), Error> {
    ctx.send(private_reply(format!("🔥 {message}"))).await?;
    Ok(())
}

async fn ok_say(ctx: &Context<'_>, message: String) -> Result<(), Error> {
    ctx.send(private_reply(message)).await?;
    Ok(())
}

/// Copies what the templates need out of the cache so no cache lock is held
/// across an await.
fn guild_snapshot(ctx: &Context<'_>) -> Option<GuildSnapshot> {
    ctx.guild().map(|guild| GuildSnapshot::from(&*guild))
}

async fn tracked_embed(ctx: &Context<'_>) -> Result<Option<TrackedEmbed>, Error> {
    let guild_id = match ctx.guild_id() {
        Some(guild_id) => guild_id,
        None => {
            err_say(ctx, "This command can only be used in a server.").await?;
            return Ok(None);
        }
    };

    match get_embed_for_guild(guild_id.get(), &ctx.data().database).await? {
        Some(tracked) => Ok(Some(tracked)),
        None => {
            err_say(ctx, "No embed is posted in this server. Use `/embed_post` first.").await?;
            Ok(None)
        }
    }
}

/// Re-renders the tracked embed, edits the posted message and saves the templates.
async fn republish(ctx: &Context<'_>, tracked: &TrackedEmbed) -> Result<(), Error> {
    let guild = guild_snapshot(ctx).ok_or("Server is not cached.")?;
    let embed = tracked
        .template
        .render(&guild)
        .into_embed(chrono::Local::now().naive_local());

    serenity::ChannelId::new(tracked.channel_id)
        .edit_message(
            ctx.serenity_context(),
            serenity::MessageId::new(tracked.message_id),
            serenity::EditMessage::new().embed(embed),
        )
        .await?;

    set_embed_for_guild(tracked, &ctx.data().database).await?;

    Ok(())
}

/// Preview how text renders in this server.
///
/// Directives: `{role NAME}`, `{member NAME#TAG}`, `{text_channel NAME}`,
/// `{voice_channel NAME}`, `{count_members EXPR}` and `{list_members EXPR}`.
/// `EXPR` combines role names with `and`, `or` or `not`, for example
/// `{count_members raiders and healers not bench}`.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn preview(
    ctx: Context<'_>,
    #[description = "Text containing {directives}"] text: String,
) -> Result<(), Error> {
    let guild = match guild_snapshot(&ctx) {
        Some(guild) => guild,
        None => {
            err_say(&ctx, "This command can only be used in a server.").await?;
            return Ok(());
        }
    };

    let rendered = syntax::render(&text, &guild);
    if rendered.trim().is_empty() {
        ok_say(&ctx, "*(renders to nothing)*".to_string()).await?;
    } else {
        ok_say(&ctx, rendered).await?;
    }

    Ok(())
}

/// Post an embed whose text is kept up to date.
///
/// The description is a template (see `/preview`). The embed is re-rendered
/// periodically; posting again replaces the embed tracked for this server.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn embed_post(
    ctx: Context<'_>,
    #[description = "Channel to post in"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
    #[description = "Embed title"] title: String,
    #[description = "Embed description (template)"] description: String,
) -> Result<(), Error> {
    let guild_id = match ctx.guild_id() {
        Some(guild_id) => guild_id,
        None => {
            err_say(&ctx, "This command can only be used in a server.").await?;
            return Ok(());
        }
    };
    let guild = guild_snapshot(&ctx).ok_or("Server is not cached.")?;

    let template = EmbedTemplate::new(title, description);
    let embed = template
        .render(&guild)
        .into_embed(chrono::Local::now().naive_local());

    let message = channel
        .id
        .send_message(
            ctx.serenity_context(),
            serenity::CreateMessage::new().embed(embed),
        )
        .await?;

    set_embed_for_guild(
        &TrackedEmbed {
            guild_id: guild_id.get(),
            channel_id: channel.id.get(),
            message_id: message.id.get(),
            template,
        },
        &ctx.data().database,
    )
    .await?;

    tracing::info!(
        "Posted embed {} in channel {} of guild {}",
        message.id,
        channel.id,
        guild_id
    );
    ok_say(&ctx, format!("📌 Embed posted in <#{}>.", channel.id)).await?;

    Ok(())
}

/// Change the title or description of the posted embed.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn embed_edit(
    ctx: Context<'_>,
    #[description = "New title"] title: Option<String>,
    #[description = "New description (template)"] description: Option<String>,
) -> Result<(), Error> {
    let mut tracked = match tracked_embed(&ctx).await? {
        Some(tracked) => tracked,
        None => return Ok(()),
    };

    if title.is_none() && description.is_none() {
        err_say(&ctx, "Nothing to change.").await?;
        return Ok(());
    }
    if let Some(title) = title {
        tracked.template.title = title;
    }
    if let Some(description) = description {
        tracked.template.description = description;
    }

    republish(&ctx, &tracked).await?;
    ok_say(&ctx, "✏️ Embed updated.".to_string()).await?;

    Ok(())
}

/// Change the colour, author, thumbnail or image of the posted embed.
///
/// These are shown as written. Author links only appear once an author name is set.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn embed_style(
    ctx: Context<'_>,
    #[description = "Hex colour, e.g. #303236"] color: Option<String>,
    #[description = "Author name"] author_name: Option<String>,
    #[description = "Link opened from the author name"] author_url: Option<String>,
    #[description = "Author icon URL"] author_icon_url: Option<String>,
    #[description = "Thumbnail URL"] thumbnail_url: Option<String>,
    #[description = "Image URL"] image_url: Option<String>,
    #[description = "Clear the current style before applying these values"] reset: Option<bool>,
) -> Result<(), Error> {
    let mut tracked = match tracked_embed(&ctx).await? {
        Some(tracked) => tracked,
        None => return Ok(()),
    };

    let color = match color.as_deref().map(parse_hex_color).transpose() {
        Ok(color) => color,
        Err(e) => {
            err_say(&ctx, &e.to_string()).await?;
            return Ok(());
        }
    };

    let reset = reset.unwrap_or(false);
    let changes = [
        &author_name,
        &author_url,
        &author_icon_url,
        &thumbnail_url,
        &image_url,
    ];
    if !reset && color.is_none() && changes.iter().all(|change| change.is_none()) {
        err_say(&ctx, "Nothing to change.").await?;
        return Ok(());
    }

    let style = &mut tracked.template.style;
    if reset {
        *style = EmbedStyle::default();
    }
    style.color = color.or(style.color);
    style.author_name = author_name.or(style.author_name.take());
    style.author_url = author_url.or(style.author_url.take());
    style.author_icon_url = author_icon_url.or(style.author_icon_url.take());
    style.thumbnail_url = thumbnail_url.or(style.thumbnail_url.take());
    style.image_url = image_url.or(style.image_url.take());

    republish(&ctx, &tracked).await?;
    ok_say(&ctx, "🎨 Embed style updated.".to_string()).await?;

    Ok(())
}

/// Add a field to the posted embed.
///
/// The field name is shown as written; the value is a template.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn embed_field_add(
    ctx: Context<'_>,
    #[description = "Field name"] name: String,
    #[description = "Field value (template)"] value: String,
    #[description = "Show next to other inline fields"] inline: Option<bool>,
) -> Result<(), Error> {
    let mut tracked = match tracked_embed(&ctx).await? {
        Some(tracked) => tracked,
        None => return Ok(()),
    };

    if tracked.template.fields.len() >= MAX_FIELDS {
        err_say(&ctx, &format!("An embed can have at most {MAX_FIELDS} fields.")).await?;
        return Ok(());
    }

    tracked.template.fields.push(FieldTemplate {
        name,
        value,
        inline: inline.unwrap_or(false),
    });

    republish(&ctx, &tracked).await?;
    ok_say(
        &ctx,
        format!("➕ Field {} added.", tracked.template.fields.len()),
    )
    .await?;

    Ok(())
}

/// Remove a field from the posted embed.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn embed_field_remove(
    ctx: Context<'_>,
    #[description = "Field number, starting at 1"]
    #[min = 1]
    position: u32,
) -> Result<(), Error> {
    let position = position as usize;
    let mut tracked = match tracked_embed(&ctx).await? {
        Some(tracked) => tracked,
        None => return Ok(()),
    };

    if position == 0 || position > tracked.template.fields.len() {
        err_say(
            &ctx,
            &format!(
                "The embed has {} field(s); there is no field {position}.",
                tracked.template.fields.len()
            ),
        )
        .await?;
        return Ok(());
    }

    let removed = tracked.template.fields.remove(position - 1);

    republish(&ctx, &tracked).await?;
    ok_say(&ctx, format!("➖ Field `{}` removed.", removed.name)).await?;

    Ok(())
}

/// Stop refreshing the posted embed.
///
/// The message itself is left in place with its last rendered text.
#[poise::command(slash_command, guild_only, default_member_permissions = "MANAGE_ROLES")]
pub async fn embed_forget(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = match ctx.guild_id() {
        Some(guild_id) => guild_id,
        None => {
            err_say(&ctx, "This command can only be used in a server.").await?;
            return Ok(());
        }
    };

    clear_embed_for_guild(guild_id.get(), &ctx.data().database).await?;

    ok_say(&ctx, "🧹 The embed is no longer refreshed.".to_string()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_are_ephemeral() {
        let reply = private_reply("🧹 The embed is no longer refreshed.".to_string());

        assert_eq!(reply.ephemeral, Some(true));
        assert_eq!(
            reply.content.as_deref(),
            Some("🧹 The embed is no longer refreshed.")
        );
    }
}
