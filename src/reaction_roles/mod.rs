pub mod appearance;
pub mod emoji;
pub mod error;
pub mod mapping;
pub mod menu;
pub mod permissions;
pub mod registry;
pub mod sync;

pub use appearance::{Appearance, build_embed};
pub use emoji::EmojiKey;
pub use mapping::{MappingDraft, RoleInfo, RoleMapping};
pub use menu::ReactionRoleMenu;
pub use registry::MenuRegistry;
pub use sync::{ReactionChange, SyncOutcome, sync_reaction};
