use crate::{Context, Error};
use dashmap::DashSet;
use poise::serenity_prelude as serenity;
use serenity::collector::MessageCollector;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, UserId};
use std::time::Duration;

pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);
pub const PAIR_TIMEOUT: Duration = Duration::from_secs(120);

pub const TIMED_OUT: &str = "Timed out. Please run the command again when ready.";
pub const CANCELLED: &str = "Cancelled reaction role setup.";

pub enum Answer {
    Reply(Message),
    Cancelled,
    TimedOut,
}

pub fn is_keyword(text: &str, keyword: &str) -> bool {
    text.trim().eq_ignore_ascii_case(keyword)
}

/// Asks questions in the invoking channel and waits for the invoker's replies.
pub struct Prompter<'a> {
    ctx: Context<'a>,
}

impl<'a> Prompter<'a> {
    pub fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }

    pub async fn say(&self, text: impl Into<String>) -> Result<Message, Error> {
        Ok(self.ctx.channel_id().say(self.ctx.http(), text).await?)
    }

    pub async fn ask(&self, question: &str, timeout: Duration) -> Result<Answer, Error> {
        self.say(question).await?;

        let reply = MessageCollector::new(self.ctx.serenity_context())
            .author_id(self.ctx.author().id)
            .channel_id(self.ctx.channel_id())
            .timeout(timeout)
            .next()
            .await;

        Ok(match reply {
            None => Answer::TimedOut,
            Some(msg) if is_keyword(&msg.content, "cancel") => Answer::Cancelled,
            Some(msg) => Answer::Reply(msg),
        })
    }
}

/// Tracks which (channel, author) pairs have a wizard running, so two wizards
/// never compete for the same replies.
#[derive(Debug, Default)]
pub struct ActiveWizards {
    running: DashSet<(ChannelId, UserId)>,
}

impl ActiveWizards {
    pub fn try_start(&self, channel_id: ChannelId, user_id: UserId) -> Option<WizardGuard<'_>> {
        let key = (channel_id, user_id);
        self.running.insert(key).then_some(WizardGuard {
            running: &self.running,
            key,
        })
    }
}

pub struct WizardGuard<'a> {
    running: &'a DashSet<(ChannelId, UserId)>,
    key: (ChannelId, UserId),
}

impl Drop for WizardGuard<'_> {
    fn drop(&mut self) {
        self.running.remove(&self.key);
    }
}
