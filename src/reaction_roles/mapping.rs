use poise::serenity_prelude as serenity;
use serenity::model::channel::ReactionType;
use serenity::model::guild::Role;
use serenity::model::id::{GuildId, RoleId};

use super::emoji::{EmojiKey, parse_emoji};
use super::error::MappingError;

/// Discord refuses more than 20 distinct reactions on a single message.
pub const MAX_MAPPINGS: usize = 20;

/// The parts of a role the wizard cares about, detached from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
    pub position: u16,
    pub managed: bool,
    pub is_everyone: bool,
}

impl RoleInfo {
    pub fn from_role(role: &Role, guild_id: GuildId) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            position: role.position,
            managed: role.managed,
            is_everyone: role.id.get() == guild_id.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    pub emoji: ReactionType,
    pub role_id: RoleId,
    pub role_name: String,
}

impl RoleMapping {
    pub fn key(&self) -> EmojiKey {
        EmojiKey::from(&self.emoji)
    }
}

/// A mapping message split into its emoji and the text naming the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairInput {
    pub emoji: ReactionType,
    pub role_query: String,
}

pub fn parse_pair(text: &str) -> Result<PairInput, MappingError> {
    let mut parts = text.split_whitespace();
    let emoji = parts.next().ok_or(MappingError::MissingRole)?;
    let role_query = parts.collect::<Vec<_>>().join(" ");
    if role_query.is_empty() {
        return Err(MappingError::MissingRole);
    }

    Ok(PairInput {
        emoji: parse_emoji(emoji)?,
        role_query,
    })
}

/// Finds the role a mapping message refers to.
///
/// Role mentions carried by the message win, then a mention or raw id typed in
/// the query, then a case-insensitive name match.
pub fn resolve_role<'r>(
    roles: &'r [RoleInfo],
    mentioned: &[RoleId],
    query: &str,
) -> Result<&'r RoleInfo, MappingError> {
    let by_id = |id: RoleId| roles.iter().find(|r| r.id == id);

    if let Some(role) = mentioned.first().and_then(|id| by_id(*id)) {
        return Ok(role);
    }

    let raw = query
        .strip_prefix("<@&")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(query);
    if let Some(role) = raw
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .and_then(|id| by_id(RoleId::new(id)))
    {
        return Ok(role);
    }

    // Matches both "@everyone" and "everyone" whichever way the role is named
    let name = query.trim_start_matches('@').to_lowercase();
    roles
        .iter()
        .find(|r| r.name.trim_start_matches('@').to_lowercase() == name)
        .ok_or_else(|| MappingError::RoleNotFound(query.to_string()))
}

pub fn check_manageable(role: &RoleInfo, bot_top_position: u16) -> Result<(), MappingError> {
    if role.is_everyone {
        return Err(MappingError::Everyone);
    }
    if role.managed {
        return Err(MappingError::Managed(role.name.clone()));
    }
    if role.position >= bot_top_position {
        return Err(MappingError::AboveBotRole(role.name.clone()));
    }
    Ok(())
}

/// Position of the highest role among `member_roles`, 0 when it holds none.
pub fn highest_position(roles: &[RoleInfo], member_roles: &[RoleId]) -> u16 {
    roles
        .iter()
        .filter(|r| member_roles.contains(&r.id))
        .map(|r| r.position)
        .max()
        .unwrap_or(0)
}

/// Mappings collected so far by a running wizard.
#[derive(Debug, Default)]
pub struct MappingDraft {
    mappings: Vec<RoleMapping>,
}

impl MappingDraft {
    /// Parses one mapping message, validates it and adds it to the draft.
    pub fn accept(
        &mut self,
        text: &str,
        mentioned: &[RoleId],
        roles: &[RoleInfo],
        bot_top_position: u16,
    ) -> Result<&RoleMapping, MappingError> {
        let pair = parse_pair(text)?;
        let role = resolve_role(roles, mentioned, &pair.role_query)?;
        check_manageable(role, bot_top_position)?;

        self.push(RoleMapping {
            emoji: pair.emoji,
            role_id: role.id,
            role_name: role.name.clone(),
        })
    }

    pub fn push(&mut self, mapping: RoleMapping) -> Result<&RoleMapping, MappingError> {
        let key = mapping.key();
        if let Some(existing) = self.mappings.iter().find(|m| m.key() == key) {
            return Err(MappingError::DuplicateEmoji {
                emoji: existing.emoji.to_string(),
                role: existing.role_name.clone(),
            });
        }
        if self.is_full() {
            return Err(MappingError::TooMany);
        }

        self.mappings.push(mapping);
        Ok(&self.mappings[self.mappings.len() - 1])
    }

    pub fn is_full(&self) -> bool {
        self.mappings.len() >= MAX_MAPPINGS
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn into_inner(self) -> Vec<RoleMapping> {
        self.mappings
    }
}
