use crate::command::prompt::{
    Answer, CANCELLED, PAIR_TIMEOUT, PROMPT_TIMEOUT, Prompter, TIMED_OUT, is_keyword,
};
use crate::db;
use crate::reaction_roles::appearance::{
    DESCRIPTION_LIMIT, TITLE_LIMIT, parse_colour, parse_optional_text,
};
use crate::reaction_roles::mapping::{MAX_MAPPINGS, highest_position};
use crate::reaction_roles::permissions::check_setup_permissions;
use crate::reaction_roles::{Appearance, MappingDraft, ReactionRoleMenu, RoleInfo, build_embed};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use serenity::builder::CreateMessage;
use serenity::model::channel::Message;
use serenity::model::guild::Member;
use serenity::model::id::GuildId;
use serenity::model::permissions::Permissions;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, error, info};

const PAIR_INSTRUCTIONS: &str = "Now send emoji and role pairs, one per message. \
    Examples: `😄 @Role`, `<:custom:123456> @Role`, or `😄 RoleName`.\n\
    When finished, type `done`. Type `cancel` to abort.";

/// What the wizard needs from the guild cache, copied out so no cache lock is
/// held across an await.
struct GuildSnapshot {
    author_permissions: Permissions,
    bot_permissions: Permissions,
    bot_top_position: u16,
    roles: Vec<RoleInfo>,
}

impl GuildSnapshot {
    fn capture(ctx: Context<'_>, guild_id: GuildId, author: &Member, bot: &Member) -> Result<Self, Error> {
        let guild = ctx
            .guild()
            .ok_or("This server is not in my cache yet, try again in a moment.")?;

        let roles: Vec<RoleInfo> = guild
            .roles
            .values()
            .map(|role| RoleInfo::from_role(role, guild_id))
            .collect();

        Ok(Self {
            author_permissions: guild.member_permissions(author),
            bot_permissions: guild.member_permissions(bot),
            bot_top_position: highest_position(&roles, &bot.roles),
            roles,
        })
    }
}

enum Step<T> {
    Next(T),
    Abort,
}

/// Repeats `question` until the reply parses, the user cancels or time runs out.
async fn ask_until<T, E, F>(
    prompter: &Prompter<'_>,
    question: &str,
    timeout: Duration,
    parse: F,
) -> Result<Step<T>, Error>
where
    E: Display,
    F: Fn(&Message) -> Result<T, E>,
{
    loop {
        match prompter.ask(question, timeout).await? {
            Answer::Reply(msg) => match parse(&msg) {
                Ok(value) => return Ok(Step::Next(value)),
                Err(e) => {
                    prompter.say(e.to_string()).await?;
                }
            },
            Answer::Cancelled => {
                prompter.say(CANCELLED).await?;
                return Ok(Step::Abort);
            }
            Answer::TimedOut => {
                prompter.say(TIMED_OUT).await?;
                return Ok(Step::Abort);
            }
        }
    }
}

macro_rules! next_or_return {
    ($step:expr) => {
        match $step? {
            Step::Next(value) => value,
            Step::Abort => return Ok(()),
        }
    };
}

/// Create an embed reaction-role menu interactively.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    rename = "reactionroles",
    aliases("rr")
)]
pub async fn reaction_roles(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command can only be used in a server.")?;
    let author_id = ctx.author().id;

    let Some(_wizard) = ctx.data().wizards.try_start(ctx.channel_id(), author_id) else {
        ctx.say("You already have a reaction role setup running in this channel.")
            .await?;
        return Ok(());
    };

    // Slash interactions must be answered within three seconds
    ctx.defer().await?;

    let author = ctx
        .author_member()
        .await
        .ok_or("Could not look up your membership in this server.")?
        .into_owned();
    let bot = guild_id
        .member(ctx.serenity_context(), ctx.framework().bot_id)
        .await?;
    let snapshot = GuildSnapshot::capture(ctx, guild_id, &author, &bot)?;

    if let Err(e) = check_setup_permissions(snapshot.author_permissions, snapshot.bot_permissions) {
        ctx.say(e.to_string()).await?;
        return Ok(());
    }

    ctx.say("Let's build a reaction role menu. Type `cancel` at any prompt to stop.")
        .await?;
    let prompter = Prompter::new(ctx);

    let title = next_or_return!(
        ask_until(
            &prompter,
            "Please enter the embed title (or type `none` for no title):",
            PROMPT_TIMEOUT,
            |msg| parse_optional_text(&msg.content, TITLE_LIMIT),
        )
        .await
    );
    let description = next_or_return!(
        ask_until(
            &prompter,
            "Please enter the embed description (or type `none` for no description):",
            PROMPT_TIMEOUT,
            |msg| parse_optional_text(&msg.content, DESCRIPTION_LIMIT),
        )
        .await
    );
    let colour = next_or_return!(
        ask_until(
            &prompter,
            "Enter an embed color (hex like `#00FF00`) or type `none` to use default:",
            PROMPT_TIMEOUT,
            |msg| parse_colour(&msg.content),
        )
        .await
    );
    let appearance = Appearance {
        title,
        description,
        colour,
    };

    prompter.say(PAIR_INSTRUCTIONS).await?;

    let mut draft = MappingDraft::default();
    loop {
        if draft.is_full() {
            prompter
                .say(format!(
                    "That's {MAX_MAPPINGS} mappings, the most one message can hold. Finishing up."
                ))
                .await?;
            break;
        }

        let msg = match prompter
            .ask("Send an emoji and a role (or `done` / `cancel`):", PAIR_TIMEOUT)
            .await?
        {
            Answer::Reply(msg) => msg,
            Answer::Cancelled => {
                prompter.say(CANCELLED).await?;
                return Ok(());
            }
            Answer::TimedOut => {
                prompter.say(TIMED_OUT).await?;
                return Ok(());
            }
        };
        if is_keyword(&msg.content, "done") {
            break;
        }

        let reply = match draft.accept(
            &msg.content,
            &msg.mention_roles,
            &snapshot.roles,
            snapshot.bot_top_position,
        ) {
            Ok(mapping) => format!("Added mapping: {} -> {}", mapping.emoji, mapping.role_name),
            Err(e) => e.to_string(),
        };
        debug!("Draft for {} now holds {} mappings", author_id, draft.len());
        prompter.say(reply).await?;
    }

    if draft.is_empty() {
        prompter.say("No mappings provided. Aborting.").await?;
        return Ok(());
    }

    let mappings = draft.into_inner();
    let sent = ctx
        .channel_id()
        .send_message(
            ctx.serenity_context(),
            CreateMessage::new().embed(build_embed(&appearance, &mappings)),
        )
        .await?;

    let menu = ctx.data().menus.insert(ReactionRoleMenu::new(
        sent.id,
        sent.channel_id,
        guild_id,
        author_id,
        mappings,
    ));
    if let Err(e) = db::save_menu(&ctx.data().db, &menu).await {
        error!("Failed to persist reaction role menu {}: {:?}", sent.id, e);
    }

    for mapping in &menu.mappings {
        if let Err(e) = sent.react(ctx.serenity_context(), mapping.emoji.clone()).await {
            error!("Failed to react with {}: {:?}", mapping.emoji, e);
            prompter
                .say(format!(
                    "Warning: failed to react with {}. Make sure the emoji is valid and I have access to it.",
                    mapping.emoji
                ))
                .await?;
        }
    }

    info!(
        "Reaction role menu {} created in guild {} with {} mappings",
        sent.id,
        guild_id,
        menu.mappings.len()
    );
    prompter
        .say("Reaction role message created and collector started.")
        .await?;
    Ok(())
}
