use std::time::Duration;

use chrono::Local;
use serenity::all::{ChannelId, EditMessage, GuildId, MessageId};
use sqlx::PgPool;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::embeds::queries::{forget_embed_message, get_all_embeds, TrackedEmbed};
use crate::syntax::GuildSnapshot;

/// Re-renders every tracked embed against the current cache, forever.
///
/// A failure for one guild never stops the loop. Embeds whose message was
/// deleted stop being tracked.
pub async fn refresh_tracked_embeds(ctx: serenity::client::Context, pool: PgPool, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let embeds = match get_all_embeds(&pool).await {
            Ok(embeds) => embeds,
            Err(e) => {
                warn!("Failed to load tracked embeds: {:?}", e);
                continue;
            }
        };

        for tracked in embeds {
            match refresh_embed(&ctx, &tracked).await {
                Ok(()) => {}
                Err(e) if is_unknown_message(&e) => {
                    info!(
                        "Embed message {} in guild {} is gone. No longer tracking it.",
                        tracked.message_id, tracked.guild_id
                    );
                    // a newer post for the same guild must survive
                    if let Err(e) =
                        forget_embed_message(tracked.guild_id, tracked.message_id, &pool).await
                    {
                        error!("Failed to forget embed of guild {}: {:?}", tracked.guild_id, e);
                    }
                }
                Err(e) => {
                    warn!("Failed to refresh embed in guild {}: {:?}", tracked.guild_id, e);
                }
            }
        }
    }
}

async fn refresh_embed(
    ctx: &serenity::client::Context,
    tracked: &TrackedEmbed,
) -> Result<(), serenity::Error> {
    let guild = ctx
        .cache
        .guild(GuildId::new(tracked.guild_id))
        .map(|guild| GuildSnapshot::from(&*guild));
    let guild = match guild {
        Some(guild) => guild,
        None => {
            debug!("Guild {} not cached. Skipping refresh.", tracked.guild_id);
            return Ok(());
        }
    };

    let embed = tracked
        .template
        .render(&guild)
        .into_embed(Local::now().naive_local());

    ChannelId::new(tracked.channel_id)
        .edit_message(
            ctx,
            MessageId::new(tracked.message_id),
            EditMessage::new().embed(embed),
        )
        .await?;

    debug!("Refreshed embed in guild {}", tracked.guild_id);

    Ok(())
}

fn is_unknown_message(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(e) => e
            .status_code()
            .map(|status| status.as_u16() == 404)
            .unwrap_or(false),
        _ => false,
    }
}
