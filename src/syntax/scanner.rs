//! Substitution of `{directive argument}` tokens in free-form text.
//!
//! Directives are matched by literal prefix (the trailing space is part of the
//! prefix). Anything that fails to resolve becomes [`UNRESOLVED`]; unknown or
//! unterminated tokens are passed through.

use serenity::model::mention::Mentionable;

use super::{expression, Directory};

/// Marker written in place of a directive that could not be resolved.
pub const UNRESOLVED: &str = "[None]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    ListMembers,
    CountMembers,
    Role,
    Member,
    TextChannel,
    VoiceChannel,
}

const DIRECTIVES: [(&str, DirectiveKind); 6] = [
    ("list_members ", DirectiveKind::ListMembers),
    ("count_members ", DirectiveKind::CountMembers),
    ("role ", DirectiveKind::Role),
    ("member ", DirectiveKind::Member),
    ("text_channel ", DirectiveKind::TextChannel),
    ("voice_channel ", DirectiveKind::VoiceChannel),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Directive<'a> {
    kind: DirectiveKind,
    argument: &'a str,
}

impl<'a> Directive<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        DIRECTIVES.iter().find_map(|&(prefix, kind)| {
            text.strip_prefix(prefix)
                .map(|argument| Directive { kind, argument })
        })
    }

    fn resolve<D: Directory + ?Sized>(&self, directory: &D) -> Option<String> {
        let argument = self.argument;
        match self.kind {
            DirectiveKind::ListMembers => members(argument, directory).map(|members| {
                members
                    .iter()
                    .map(|member| member.mention().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
            DirectiveKind::CountMembers => {
                members(argument, directory).map(|members| members.len().to_string())
            }
            DirectiveKind::Role => directory
                .role_by_name(argument)
                .map(|role| role.mention().to_string()),
            DirectiveKind::Member => {
                let (name, tag) = argument.split_once('#')?;
                directory
                    .member_by_tag(name, tag)
                    .map(|member| member.mention().to_string())
            }
            DirectiveKind::TextChannel => directory
                .text_channel_by_name(argument)
                .map(|channel| channel.mention().to_string()),
            DirectiveKind::VoiceChannel => directory
                .voice_channel_by_name(argument)
                .map(|channel| channel.mention().to_string()),
        }
    }
}

fn members<D: Directory + ?Sized>(
    expression: &str,
    directory: &D,
) -> Option<Vec<serenity::all::UserId>> {
    match expression::evaluate(expression, directory) {
        Ok(members) => Some(members),
        Err(e) => {
            tracing::debug!("Role expression `{}` failed: {}", expression, e);
            None
        }
    }
}

/// Replaces every directive in `text` with its value from `directory`.
///
/// Single left-to-right pass; substituted values are never scanned again.
pub fn render<D: Directory + ?Sized>(text: &str, directory: &D) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let close = match rest[open..].find('}') {
            Some(offset) => open + offset,
            None => break,
        };

        output.push_str(&rest[..open]);

        let body = rest[open + 1..close].trim();
        match Directive::parse(body) {
            Some(directive) => match directive.resolve(directory) {
                Some(value) => output.push_str(&value),
                None => {
                    tracing::debug!("Directive `{}` did not resolve.", body);
                    output.push_str(UNRESOLVED);
                }
            },
            None => {
                output.push('{');
                output.push_str(body);
                output.push('}');
            }
        }

        rest = &rest[close + 1..];
    }

    output.push_str(rest);
    output
}
