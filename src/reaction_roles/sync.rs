use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serenity::http::Http;
use serenity::model::id::{GuildId, RoleId, UserId};
use tracing::debug;

use super::emoji::EmojiKey;
use super::menu::ReactionRoleMenu;
use crate::Error;

const AUDIT_REASON: &str = "Reaction role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Granted(RoleId),
    Revoked(RoleId),
    /// The member already matched the reaction state
    Unchanged(RoleId),
    Ignored,
}

/// A guild member as seen at the time of the reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub is_bot: bool,
    pub roles: Vec<RoleId>,
}

#[async_trait]
pub trait MemberRoles: Send + Sync {
    /// `Ok(None)` when the user is not (or no longer) in the guild.
    async fn fetch_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<MemberSnapshot>, Error>;

    async fn add_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> Result<(), Error>;

    async fn remove_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> Result<(), Error>;
}

fn is_not_found(err: &::serenity::Error) -> bool {
    match err {
        ::serenity::Error::Http(http) => http.status_code().is_some_and(|s| s.as_u16() == 404),
        _ => false,
    }
}

#[async_trait]
impl MemberRoles for Http {
    async fn fetch_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<MemberSnapshot>, Error> {
        match self.get_member(guild_id, user_id).await {
            Ok(member) => Ok(Some(MemberSnapshot {
                is_bot: member.user.bot,
                roles: member.roles,
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn add_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> Result<(), Error> {
        self.add_member_role(guild_id, user_id, role_id, Some(AUDIT_REASON))
            .await?;
        Ok(())
    }

    async fn remove_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> Result<(), Error> {
        self.remove_member_role(guild_id, user_id, role_id, Some(AUDIT_REASON))
            .await?;
        Ok(())
    }
}

/// Brings a member's roles in line with one reaction event on a menu.
pub async fn sync_reaction<M>(
    members: &M,
    menu: &ReactionRoleMenu,
    user_id: UserId,
    emoji: &EmojiKey,
    change: ReactionChange,
) -> Result<SyncOutcome, Error>
where
    M: MemberRoles + ?Sized,
{
    let Some(mapping) = menu.role_for(emoji) else {
        return Ok(SyncOutcome::Ignored);
    };
    let role_id = mapping.role_id;

    let Some(member) = members.fetch_member(menu.guild_id, user_id).await? else {
        debug!("User {} is not a member of guild {}", user_id, menu.guild_id);
        return Ok(SyncOutcome::Ignored);
    };
    if member.is_bot {
        return Ok(SyncOutcome::Ignored);
    }

    let has_role = member.roles.contains(&role_id);
    match change {
        ReactionChange::Added if !has_role => {
            members.add_role(menu.guild_id, user_id, role_id).await?;
            Ok(SyncOutcome::Granted(role_id))
        }
        ReactionChange::Removed if has_role => {
            members.remove_role(menu.guild_id, user_id, role_id).await?;
            Ok(SyncOutcome::Revoked(role_id))
        }
        _ => Ok(SyncOutcome::Unchanged(role_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction_roles::emoji::parse_emoji;
    use crate::reaction_roles::mapping::RoleMapping;
    use ::serenity::model::id::{ChannelId, MessageId};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const GUILD: u64 = 3;
    const GAMER: u64 = 10;

    #[derive(Default)]
    struct FakeMembers {
        members: Mutex<HashMap<UserId, MemberSnapshot>>,
        calls: Mutex<Vec<(&'static str, UserId, RoleId)>>,
    }

    impl FakeMembers {
        fn with_member(self, user: u64, is_bot: bool, roles: &[u64]) -> Self {
            self.members.lock().unwrap().insert(
                UserId::new(user),
                MemberSnapshot {
                    is_bot,
                    roles: roles.iter().copied().map(RoleId::new).collect(),
                },
            );
            self
        }

        fn calls(&self) -> Vec<(&'static str, UserId, RoleId)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MemberRoles for FakeMembers {
        async fn fetch_member(
            &self,
            guild_id: GuildId,
            user_id: UserId,
        ) -> Result<Option<MemberSnapshot>, Error> {
            assert_eq!(guild_id, GuildId::new(GUILD));
            Ok(self.members.lock().unwrap().get(&user_id).cloned())
        }

        async fn add_role(&self, _: GuildId, user_id: UserId, role_id: RoleId) -> Result<(), Error> {
            self.calls.lock().unwrap().push(("add", user_id, role_id));
            Ok(())
        }

        async fn remove_role(&self, _: GuildId, user_id: UserId, role_id: RoleId) -> Result<(), Error> {
            self.calls.lock().unwrap().push(("remove", user_id, role_id));
            Ok(())
        }
    }

    fn menu() -> ReactionRoleMenu {
        ReactionRoleMenu::new(
            MessageId::new(1),
            ChannelId::new(2),
            GuildId::new(GUILD),
            UserId::new(4),
            vec![RoleMapping {
                emoji: parse_emoji("😄").unwrap(),
                role_id: RoleId::new(GAMER),
                role_name: "Gamer".to_string(),
            }],
        )
    }

    fn smile() -> EmojiKey {
        EmojiKey::Unicode("😄".to_string())
    }

    #[tokio::test]
    async fn test_add_grants_missing_role() {
        let members = FakeMembers::default().with_member(100, false, &[]);
        let outcome = sync_reaction(&members, &menu(), UserId::new(100), &smile(), ReactionChange::Added)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Granted(RoleId::new(GAMER)));
        assert_eq!(members.calls(), vec![("add", UserId::new(100), RoleId::new(GAMER))]);
    }

    #[tokio::test]
    async fn test_add_skips_when_role_held() {
        let members = FakeMembers::default().with_member(100, false, &[GAMER]);
        let outcome = sync_reaction(&members, &menu(), UserId::new(100), &smile(), ReactionChange::Added)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Unchanged(RoleId::new(GAMER)));
        assert!(members.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_revokes_held_role() {
        let members = FakeMembers::default().with_member(100, false, &[GAMER, 99]);
        let outcome = sync_reaction(&members, &menu(), UserId::new(100), &smile(), ReactionChange::Removed)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Revoked(RoleId::new(GAMER)));
        assert_eq!(members.calls(), vec![("remove", UserId::new(100), RoleId::new(GAMER))]);

        let members = FakeMembers::default().with_member(100, false, &[]);
        let outcome = sync_reaction(&members, &menu(), UserId::new(100), &smile(), ReactionChange::Removed)
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Unchanged(RoleId::new(GAMER)));
        assert!(members.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ignored_cases() {
        let members = FakeMembers::default().with_member(200, true, &[]);

        // Unmapped emoji
        let frown = EmojiKey::Unicode("🙁".to_string());
        let outcome = sync_reaction(&members, &menu(), UserId::new(200), &frown, ReactionChange::Added)
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);

        // Bots
        let outcome = sync_reaction(&members, &menu(), UserId::new(200), &smile(), ReactionChange::Added)
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);

        // Users who left the guild
        let outcome = sync_reaction(&members, &menu(), UserId::new(300), &smile(), ReactionChange::Added)
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);

        assert!(members.calls().is_empty());
    }
}
