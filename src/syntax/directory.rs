use serenity::all::{ChannelId, RoleId, UserId};

/// Read-only lookup surface the template engine resolves names against.
///
/// Implementations are owned by the host. Every call is answered from whatever
/// state the implementation holds at that moment; nothing is cached between
/// calls on the engine's side.
pub trait Directory {
    /// First role whose name is exactly `name`.
    fn role_by_name(&self, name: &str) -> Option<RoleId>;

    /// Members holding `role`, in directory order.
    fn role_members(&self, role: RoleId) -> Vec<UserId>;

    /// Member addressed by `name#tag`.
    fn member_by_tag(&self, name: &str, tag: &str) -> Option<UserId>;

    fn text_channel_by_name(&self, name: &str) -> Option<ChannelId>;

    fn voice_channel_by_name(&self, name: &str) -> Option<ChannelId>;

    /// Every known member, in directory order.
    fn members(&self) -> Vec<UserId>;
}
