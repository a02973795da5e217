//! Errors raised while building a reaction-role menu.
//!
//! The `Display` text of each variant is what the wizard sends back to the
//! user, so keep it readable.

use thiserror::Error;

use super::mapping::MAX_MAPPINGS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("Invalid format. Please send `emoji @Role` or `emoji RoleName`.")]
    MissingRole,
    #[error("`{0}` is not an emoji I can react with. Try again.")]
    InvalidEmoji(String),
    #[error("Role not found: {0}. Try again.")]
    RoleNotFound(String),
    #[error("I cannot manage the role {0} because it's higher or equal to my highest role.")]
    AboveBotRole(String),
    #[error("The @everyone role cannot be handed out with reactions.")]
    Everyone,
    #[error("The role {0} is managed by an integration and cannot be assigned.")]
    Managed(String),
    #[error("{emoji} is already mapped to {role}.")]
    DuplicateEmoji { emoji: String, role: String },
    #[error("A menu can hold at most {} reactions.", MAX_MAPPINGS)]
    TooMany,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppearanceError {
    #[error("That is too long, the limit is {limit} characters. Try again.")]
    TooLong { limit: usize },
    #[error("`{0}` is not a color. Use a hex code like `#00FF00`, a color name, or `none`.")]
    InvalidColour(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("You need the `Manage Roles` permission to create reaction roles.")]
    Author,
    #[error("I need `Manage Roles`, `Add Reactions` and `Manage Messages` permissions to create reaction roles.")]
    Bot,
}
