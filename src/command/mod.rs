pub mod prompt;
pub mod reaction_roles;

pub use reaction_roles::reaction_roles;
