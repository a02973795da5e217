use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};

use super::emoji::EmojiKey;
use super::mapping::RoleMapping;

/// A posted announcement whose reactions hand out roles.
#[derive(Debug, Clone)]
pub struct ReactionRoleMenu {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub mappings: Vec<RoleMapping>,
}

impl ReactionRoleMenu {
    pub fn new(
        message_id: MessageId,
        channel_id: ChannelId,
        guild_id: GuildId,
        created_by: UserId,
        mappings: Vec<RoleMapping>,
    ) -> Self {
        Self {
            message_id,
            channel_id,
            guild_id,
            created_by,
            created_at: Utc::now(),
            mappings,
        }
    }

    pub fn role_for(&self, emoji: &EmojiKey) -> Option<&RoleMapping> {
        self.mappings.iter().find(|m| &m.key() == emoji)
    }
}
