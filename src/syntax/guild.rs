use std::num::NonZeroU16;

use serenity::all::{ChannelId, ChannelType, Guild, RoleId, UserId};

use super::Directory;

#[derive(Debug, Clone)]
struct MemberEntry {
    id: UserId,
    name: String,
    tag: String,
    roles: Vec<RoleId>,
}

/// Point-in-time copy of the parts of a cached guild the template engine reads.
///
/// Taking a snapshot lets the caller release the cache lock before doing any
/// async work with the rendered text. Roles and channels are kept in ascending
/// position order, so a duplicate name resolves to the lowest role in the
/// hierarchy (or the first channel in the list); members are ordered by id so
/// repeated renders produce the same listing.
#[derive(Debug, Clone, Default)]
pub struct GuildSnapshot {
    everyone: Option<RoleId>,
    roles: Vec<(String, RoleId)>,
    members: Vec<MemberEntry>,
    text_channels: Vec<(String, ChannelId)>,
    voice_channels: Vec<(String, ChannelId)>,
}

/// Renders a discriminator the way users type it after the `#`.
///
/// Accounts migrated to unique usernames have no discriminator and are
/// addressed as `name#0`.
pub fn member_tag(discriminator: Option<NonZeroU16>) -> String {
    match discriminator {
        Some(discriminator) => format!("{:04}", discriminator.get()),
        None => "0".to_string(),
    }
}

impl From<&Guild> for GuildSnapshot {
    fn from(guild: &Guild) -> Self {
        let mut members: Vec<MemberEntry> = guild
            .members
            .values()
            .map(|member| MemberEntry {
                id: member.user.id,
                name: member.user.name.clone(),
                tag: member_tag(member.user.discriminator),
                roles: member.roles.clone(),
            })
            .collect();
        members.sort_by_key(|member| member.id);

        let channels_of_kind = |kind: ChannelType| {
            by_position(
                guild
                    .channels
                    .values()
                    .filter(|channel| channel.kind == kind)
                    .map(|channel| (channel.position, channel.id, channel.name.clone())),
            )
        };

        GuildSnapshot {
            everyone: Some(RoleId::new(guild.id.get())),
            roles: by_position(
                guild
                    .roles
                    .values()
                    .map(|role| (role.position, role.id, role.name.clone())),
            ),
            members,
            text_channels: channels_of_kind(ChannelType::Text),
            voice_channels: channels_of_kind(ChannelType::Voice),
        }
    }
}

/// Orders `(position, id, name)` entries by ascending position, then id.
fn by_position<T: Ord>(entries: impl Iterator<Item = (u16, T, String)>) -> Vec<(String, T)> {
    let mut entries: Vec<_> = entries.collect();
    entries.sort_by(|(a_position, a_id, _), (b_position, b_id, _)| {
        (a_position, a_id).cmp(&(b_position, b_id))
    });
    entries
        .into_iter()
        .map(|(_, id, name)| (name, id))
        .collect()
}

fn find_by_name<T: Copy>(entries: &[(String, T)], name: &str) -> Option<T> {
    entries
        .iter()
        .find(|(entry_name, _)| entry_name == name)
        .map(|(_, id)| *id)
}

impl Directory for GuildSnapshot {
    fn role_by_name(&self, name: &str) -> Option<RoleId> {
        find_by_name(&self.roles, name)
    }

    fn role_members(&self, role: RoleId) -> Vec<UserId> {
        // the default role is never listed on members but implicitly held by all
        if self.everyone == Some(role) {
            return self.members();
        }

        self.members
            .iter()
            .filter(|member| member.roles.contains(&role))
            .map(|member| member.id)
            .collect()
    }

    fn member_by_tag(&self, name: &str, tag: &str) -> Option<UserId> {
        self.members
            .iter()
            .find(|member| member.name == name && member.tag == tag)
            .map(|member| member.id)
    }

    fn text_channel_by_name(&self, name: &str) -> Option<ChannelId> {
        find_by_name(&self.text_channels, name)
    }

    fn voice_channel_by_name(&self, name: &str) -> Option<ChannelId> {
        find_by_name(&self.voice_channels, name)
    }

    fn members(&self) -> Vec<UserId> {
        self.members.iter().map(|member| member.id).collect()
    }
}

#[cfg(test)]
impl GuildSnapshot {
    pub(crate) fn with_everyone(mut self, id: u64) -> Self {
        self.everyone = Some(RoleId::new(id));
        self
    }

    pub(crate) fn with_role(mut self, name: &str, id: u64) -> Self {
        self.roles.push((name.to_string(), RoleId::new(id)));
        self
    }

    pub(crate) fn with_member(mut self, name: &str, tag: &str, id: u64, roles: &[u64]) -> Self {
        self.members.push(MemberEntry {
            id: UserId::new(id),
            name: name.to_string(),
            tag: tag.to_string(),
            roles: roles.iter().copied().map(RoleId::new).collect(),
        });
        self
    }

    pub(crate) fn with_text_channel(mut self, name: &str, id: u64) -> Self {
        self.text_channels.push((name.to_string(), ChannelId::new(id)));
        self
    }

    pub(crate) fn with_voice_channel(mut self, name: &str, id: u64) -> Self {
        self.voice_channels
            .push((name.to_string(), ChannelId::new(id)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild() -> GuildSnapshot {
        GuildSnapshot::default()
            .with_everyone(1)
            .with_role("mods", 10)
            .with_role("mods", 11)
            .with_member("alice", "0001", 100, &[10])
            .with_member("bob", "0", 101, &[11])
            .with_text_channel("general", 200)
            .with_voice_channel("general", 300)
    }

    #[test]
    fn member_tag_pads_legacy_discriminators() {
        assert_eq!(member_tag(NonZeroU16::new(7)), "0007");
        assert_eq!(member_tag(NonZeroU16::new(1234)), "1234");
        assert_eq!(member_tag(None), "0");
    }

    #[test]
    fn duplicate_role_names_resolve_to_first_entry() {
        assert_eq!(guild().role_by_name("mods"), Some(RoleId::new(10)));
        assert_eq!(guild().role_by_name("Mods"), None);
    }

    #[test]
    fn duplicate_role_names_resolve_to_lowest_position() {
        // arrange
        let roles = by_position(
            vec![
                (5, RoleId::new(30), "mods".to_string()),
                (0, RoleId::new(1), "@everyone".to_string()),
                (2, RoleId::new(20), "mods".to_string()),
            ]
            .into_iter(),
        );
        let guild = GuildSnapshot {
            roles,
            ..GuildSnapshot::default()
        };

        // act
        let role = guild.role_by_name("mods");

        // assert
        assert_eq!(role, Some(RoleId::new(20)));
    }

    #[test]
    fn default_role_is_held_by_every_member() {
        // arrange
        let guild = guild();

        // act
        let everyone = guild.role_members(RoleId::new(1));
        let mods = guild.role_members(RoleId::new(10));

        // assert
        assert_eq!(everyone, vec![UserId::new(100), UserId::new(101)]);
        assert_eq!(mods, vec![UserId::new(100)]);
    }

    #[test]
    fn members_are_addressed_by_name_and_tag() {
        let guild = guild();

        assert_eq!(guild.member_by_tag("alice", "0001"), Some(UserId::new(100)));
        assert_eq!(guild.member_by_tag("bob", "0"), Some(UserId::new(101)));
        assert_eq!(guild.member_by_tag("alice", "1"), None);
    }

    #[test]
    fn text_and_voice_channels_are_looked_up_separately() {
        let guild = guild();

        assert_eq!(
            guild.text_channel_by_name("general"),
            Some(ChannelId::new(200))
        );
        assert_eq!(
            guild.voice_channel_by_name("general"),
            Some(ChannelId::new(300))
        );
        assert_eq!(guild.voice_channel_by_name("music"), None);
    }
}
