use crate::{Context, Error};

const HELP_FOOTER: &str = "\
Embed text may contain directives that are filled in from this server and \
refreshed periodically: {role NAME}, {member NAME#TAG}, {text_channel NAME}, \
{voice_channel NAME}, {count_members EXPR} and {list_members EXPR}. \
EXPR is a role name, roles joined by `and` or by `or`, optionally followed \
by `not ROLE`, e.g. {count_members raiders and healers not bench}. \
Use /preview to try a text before posting it with /embed_post.";

/// Show how to use the bot.
#[poise::command(slash_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help for"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: HELP_FOOTER,
            ephemeral: true,
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}
