use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::reaction_roles::{ReactionRoleMenu, RoleMapping};

pub type DbPool = SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
struct MenuRow {
    message_id: String,
    channel_id: String,
    guild_id: String,
    created_by: String,
    created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct MappingRow {
    message_id: String,
    emoji: String,
    role_id: String,
    role_name: String,
}

pub async fn init_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        let path = path.trim_start_matches("//");
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Stores a menu, replacing any earlier copy for the same message.
pub async fn save_menu(pool: &DbPool, menu: &ReactionRoleMenu) -> Result<(), sqlx::Error> {
    let message_id = menu.message_id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO reaction_role_menus (message_id, channel_id, guild_id, created_by, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message_id)
    .bind(menu.channel_id.to_string())
    .bind(menu.guild_id.to_string())
    .bind(menu.created_by.to_string())
    .bind(menu.created_at.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM reaction_role_mappings WHERE message_id = ?")
        .bind(&message_id)
        .execute(&mut *tx)
        .await?;

    for (position, mapping) in menu.mappings.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO reaction_role_mappings (message_id, position, emoji, role_id, role_name)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message_id)
        .bind(position as i64)
        .bind(mapping.emoji.to_string())
        .bind(mapping.role_id.to_string())
        .bind(&mapping.role_name)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Loads every stored menu. Rows that no longer parse are skipped with a warning.
pub async fn load_menus(pool: &DbPool) -> Result<Vec<ReactionRoleMenu>, sqlx::Error> {
    let menus = sqlx::query_as::<_, MenuRow>("SELECT * FROM reaction_role_menus")
        .fetch_all(pool)
        .await?;
    let mapping_rows = sqlx::query_as::<_, MappingRow>(
        "SELECT message_id, emoji, role_id, role_name FROM reaction_role_mappings ORDER BY message_id, position",
    )
    .fetch_all(pool)
    .await?;

    let mut mappings: HashMap<String, Vec<RoleMapping>> = HashMap::new();
    for row in mapping_rows {
        match mapping_from_row(&row) {
            Some(mapping) => mappings.entry(row.message_id).or_default().push(mapping),
            None => warn!(
                "Skipping unreadable mapping {} -> {} on message {}",
                row.emoji, row.role_id, row.message_id
            ),
        }
    }

    let mut loaded = Vec::with_capacity(menus.len());
    for row in menus {
        let mappings = mappings.remove(&row.message_id).unwrap_or_default();
        match menu_from_row(&row, mappings) {
            Some(menu) if !menu.mappings.is_empty() => loaded.push(menu),
            Some(_) => warn!("Skipping menu {} with no usable mappings", row.message_id),
            None => warn!("Skipping unreadable menu {}", row.message_id),
        }
    }

    Ok(loaded)
}

/// Returns whether a menu was stored for this message.
pub async fn delete_menu(pool: &DbPool, message_id: MessageId) -> Result<bool, sqlx::Error> {
    let message_id = message_id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reaction_role_mappings WHERE message_id = ?")
        .bind(&message_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM reaction_role_menus WHERE message_id = ?")
        .bind(&message_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

fn parse_id(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().filter(|id| *id != 0)
}

fn mapping_from_row(row: &MappingRow) -> Option<RoleMapping> {
    Some(RoleMapping {
        emoji: ReactionType::try_from(row.emoji.as_str()).ok()?,
        role_id: RoleId::new(parse_id(&row.role_id)?),
        role_name: row.role_name.clone(),
    })
}

fn menu_from_row(row: &MenuRow, mappings: Vec<RoleMapping>) -> Option<ReactionRoleMenu> {
    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Some(ReactionRoleMenu {
        message_id: MessageId::new(parse_id(&row.message_id)?),
        channel_id: ChannelId::new(parse_id(&row.channel_id)?),
        guild_id: GuildId::new(parse_id(&row.guild_id)?),
        created_by: UserId::new(parse_id(&row.created_by)?),
        created_at,
        mappings,
    })
}
