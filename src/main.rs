use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use serenity::{Client, model::gateway::GatewayIntents};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use dotenvy::dotenv;

mod command;
mod config;
mod db;
mod events;
mod reaction_roles;

use command::prompt::ActiveWizards;
use config::Config;
use db::DbPool;
use reaction_roles::MenuRegistry;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub struct Data {
    /// Menus whose reactions are currently synced to roles
    pub menus: MenuRegistry,
    pub wizards: ActiveWizards,
    pub db: DbPool,
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => panic!("Failed to start bot: {:?}", error),
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("[config] {}", e);
            std::process::exit(1);
        }
    };
    config.warn_missing();

    let db_pool = db::init_db(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    info!("Database initialized successfully");

    let mut menus = MenuRegistry::default();
    menus.extend(
        db::load_menus(&db_pool)
            .await
            .context("Failed to load stored reaction role menus")?,
    );
    info!("Restored {} reaction role menus", menus.len());

    let options = poise::FrameworkOptions {
        commands: vec![command::reaction_roles()],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(config.prefix.clone()),
            edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                Duration::from_secs(3600),
            ))),
            ..Default::default()
        },
        owners: config.owner.into_iter().collect::<HashSet<_>>(),
        // The global error handler for all error cases that may occur
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                info!("Executing command {}...", ctx.command().qualified_name);
            })
        },
        post_command: |ctx| {
            Box::pin(async move {
                info!("Executed command {}!", ctx.command().qualified_name);
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(events::event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;

    let test_guild_id = config.test_guild_id;
    let framework = poise::Framework::builder()
        .setup(move |ctx, _ready, framework| {
            let db = db_pool.clone();
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                if let Some(guild_id) = test_guild_id {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                    info!("Registered commands for guild {}", guild_id);
                }

                Ok(Data {
                    menus,
                    wizards: ActiveWizards::default(),
                    db,
                })
            })
        })
        .options(options)
        .build();

    let mut builder = Client::builder(&config.token, intents).framework(framework);
    if let Some(client_id) = config.client_id {
        builder = builder.application_id(client_id);
    }
    let mut client = builder.await.context("Error creating client")?;

    client.start().await?;
    Ok(())
}
