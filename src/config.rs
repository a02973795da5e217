use poise::serenity_prelude as serenity;
use serenity::model::id::{ApplicationId, GuildId, UserId};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/rolemenu.db";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("{key} must be a numeric id, got `{value}`")]
    InvalidId { key: &'static str, value: String },
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Token allowing the bot to connect to Discord
    pub token: String,
    pub client_id: Option<ApplicationId>,
    /// Guild that gets slash commands registered immediately
    pub test_guild_id: Option<GuildId>,
    pub prefix: String,
    pub owner: Option<UserId>,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get("TOKEN").ok_or(ConfigError::Missing("TOKEN"))?;

        Ok(Self {
            token,
            client_id: parse_id(&get, "CLIENT_ID")?.map(ApplicationId::new),
            test_guild_id: parse_id(&get, "TEST_GUILD_ID")?.map(GuildId::new),
            prefix: get("PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            owner: parse_id(&get, "OWNER")?.map(UserId::new),
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        })
    }

    /// Logs non-fatal gaps in the configuration.
    pub fn warn_missing(&self) {
        if self.client_id.is_none() {
            warn!("CLIENT_ID is not set. Some API calls may fail.");
        }
    }
}

fn parse_id<G>(get: &G, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        // Discord ids are never zero and the id constructors panic on it
        Some(value) => match value.parse::<u64>() {
            Ok(id) if id != 0 => Ok(Some(id)),
            _ => Err(ConfigError::InvalidId { key, value }),
        },
    }
}
