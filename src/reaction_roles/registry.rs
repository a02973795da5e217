use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::model::id::MessageId;
use std::sync::Arc;

use super::menu::ReactionRoleMenu;

/// Live menus, keyed by the id of the announcement message.
#[derive(Debug, Default)]
pub struct MenuRegistry {
    menus: DashMap<MessageId, Arc<ReactionRoleMenu>>,
}

impl MenuRegistry {
    pub fn insert(&self, menu: ReactionRoleMenu) -> Arc<ReactionRoleMenu> {
        let menu = Arc::new(menu);
        self.menus.insert(menu.message_id, Arc::clone(&menu));
        menu
    }

    /// The returned `Arc` is detached from the map, so holding it across an
    /// `.await` never blocks other shards.
    pub fn get(&self, message_id: MessageId) -> Option<Arc<ReactionRoleMenu>> {
        self.menus.get(&message_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, message_id: MessageId) -> Option<Arc<ReactionRoleMenu>> {
        self.menus.remove(&message_id).map(|(_, menu)| menu)
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }
}

impl Extend<ReactionRoleMenu> for MenuRegistry {
    fn extend<I: IntoIterator<Item = ReactionRoleMenu>>(&mut self, iter: I) {
        for menu in iter {
            self.insert(menu);
        }
    }
}
