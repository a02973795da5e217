use poise::serenity_prelude as serenity;
use serenity::model::permissions::Permissions;

use super::error::PermissionError;

/// What the bot itself must hold to post a menu and hand out roles.
pub const BOT_REQUIRED: Permissions = Permissions::MANAGE_ROLES
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::MANAGE_MESSAGES);

pub fn check_setup_permissions(author: Permissions, bot: Permissions) -> Result<(), PermissionError> {
    if !author.intersects(Permissions::MANAGE_ROLES | Permissions::MANAGE_GUILD) {
        return Err(PermissionError::Author);
    }
    if !bot.contains(BOT_REQUIRED) {
        return Err(PermissionError::Bot);
    }
    Ok(())
}
