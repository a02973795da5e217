use crate::db::{self, DbPool};
use crate::reaction_roles::{
    EmojiKey, MenuRegistry, ReactionChange, ReactionRoleMenu, SyncOutcome, sync_reaction,
};
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use serenity::model::channel::Reaction;
use serenity::model::id::{MessageId, UserId};
use std::sync::Arc;
use tracing::{debug, error, info};

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.name);
            info!("Bot ID: {}", data_about_bot.user.id);
            info!("Connected to {} guilds", data_about_bot.guilds.len());
            info!("Watching {} reaction role menus", data.menus.len());
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            on_reaction(ctx, data, framework.bot_id, add_reaction, ReactionChange::Added).await;
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            let change = ReactionChange::Removed;
            on_reaction(ctx, data, framework.bot_id, removed_reaction, change).await;
        }
        serenity::FullEvent::MessageDelete {
            deleted_message_id, ..
        } => {
            forget_menu(&data.menus, &data.db, *deleted_message_id).await;
        }
        serenity::FullEvent::MessageDeleteBulk {
            multiple_deleted_messages_ids,
            ..
        } => {
            for message_id in multiple_deleted_messages_ids {
                forget_menu(&data.menus, &data.db, *message_id).await;
            }
        }
        _ => {}
    }
    Ok(())
}

async fn on_reaction(
    ctx: &serenity::Context,
    data: &Data,
    bot_id: UserId,
    reaction: &Reaction,
    change: ReactionChange,
) {
    let Some((menu, user_id)) =
        menu_for_reaction(&data.menus, bot_id, reaction.message_id, reaction.user_id)
    else {
        return;
    };

    let emoji = EmojiKey::from(&reaction.emoji);
    match sync_reaction(&*ctx.http, &menu, user_id, &emoji, change).await {
        Ok(SyncOutcome::Granted(role_id)) => {
            info!("Gave role {} to {} from menu {}", role_id, user_id, menu.message_id);
        }
        Ok(SyncOutcome::Revoked(role_id)) => {
            info!("Took role {} from {} via menu {}", role_id, user_id, menu.message_id);
        }
        Ok(outcome) => {
            debug!("Reaction by {} on menu {}: {:?}", user_id, menu.message_id, outcome);
        }
        Err(e) => {
            error!(
                "Failed to sync reaction role for {} on menu {}: {:?}",
                user_id, menu.message_id, e
            );
        }
    }
}

/// The menu a reaction belongs to, unless it is on another message or the bot
/// reacted itself.
fn menu_for_reaction(
    menus: &MenuRegistry,
    bot_id: UserId,
    message_id: MessageId,
    user_id: Option<UserId>,
) -> Option<(Arc<ReactionRoleMenu>, UserId)> {
    let user_id = user_id.filter(|id| *id != bot_id)?;
    Some((menus.get(message_id)?, user_id))
}

/// Drops a menu whose announcement was deleted. Returns whether it was live.
async fn forget_menu(menus: &MenuRegistry, db: &DbPool, message_id: MessageId) -> bool {
    if menus.remove(message_id).is_none() {
        return false;
    }

    info!("Reaction role menu {} was deleted", message_id);
    if let Err(e) = db::delete_menu(db, message_id).await {
        error!("Failed to delete stored menu {}: {:?}", message_id, e);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction_roles::RoleMapping;
    use crate::reaction_roles::emoji::parse_emoji;
    use ::serenity::model::id::{ChannelId, GuildId, RoleId};

    const BOT: u64 = 900;

    fn menu(message_id: u64) -> ReactionRoleMenu {
        ReactionRoleMenu::new(
            MessageId::new(message_id),
            ChannelId::new(2),
            GuildId::new(3),
            UserId::new(4),
            vec![RoleMapping {
                emoji: parse_emoji("😄").unwrap(),
                role_id: RoleId::new(10),
                role_name: "Gamer".to_string(),
            }],
        )
    }

    #[test]
    fn test_reaction_routing() {
        let menus = MenuRegistry::default();
        menus.insert(menu(1));
        let bot = UserId::new(BOT);

        let (found, user) =
            menu_for_reaction(&menus, bot, MessageId::new(1), Some(UserId::new(100))).unwrap();
        assert_eq!(found.message_id, MessageId::new(1));
        assert_eq!(user, UserId::new(100));

        // The bot's own reactions
        assert!(menu_for_reaction(&menus, bot, MessageId::new(1), Some(bot)).is_none());
        // Messages that are not menus
        let stranger = Some(UserId::new(100));
        assert!(menu_for_reaction(&menus, bot, MessageId::new(2), stranger).is_none());
        // Reactions without a user
        assert!(menu_for_reaction(&menus, bot, MessageId::new(1), None).is_none());
    }

    #[tokio::test]
    async fn test_forget_menu_drops_registry_and_storage() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("menus.db").display());
        let pool = db::init_db(&url).await.unwrap();

        let menus = MenuRegistry::default();
        for id in [1, 2] {
            let live = menus.insert(menu(id));
            db::save_menu(&pool, &live).await.unwrap();
        }

        assert!(forget_menu(&menus, &pool, MessageId::new(1)).await);
        assert!(!forget_menu(&menus, &pool, MessageId::new(99)).await);

        // Bulk deletes go through the same path one id at a time
        assert!(forget_menu(&menus, &pool, MessageId::new(2)).await);
        assert!(!forget_menu(&menus, &pool, MessageId::new(2)).await);

        assert_eq!(menus.len(), 0);
        assert!(db::load_menus(&pool).await.unwrap().is_empty());
    }
}
