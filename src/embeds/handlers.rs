use serenity::gateway::ChunkGuildFilter;

/// Asks the gateway for the full member list of a large guild.
///
/// Large guilds arrive with only part of their members; role expressions need
/// all of them in the cache.
pub fn guild_create(ctx: &serenity::client::Context, guild: &serenity::all::Guild) {
    if !guild.large {
        tracing::debug!("Guild {} arrived with all members.", guild.id);
        return;
    }

    tracing::debug!(
        "Requesting {} members of guild {}.",
        guild.member_count,
        guild.id
    );
    ctx.shard
        .chunk_guild(guild.id, None, false, ChunkGuildFilter::None, None);
}
