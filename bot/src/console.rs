//! Line-oriented driver: feeds chat events typed on stdin into the dispatcher,
//! against an in-memory platform seeded from the configuration.
//!
//! Line format:
//!   `<user>[,<role>...] <channel> <text>` posts a message
//!   `+<emoji> <user>[,<role>...] <channel> <message>` adds a reaction
//!
//! Examples:
//!   `42,99 30 !archive`
//!   `+👍 42,99 20 1000003`

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::engine::events::{BotEvent, IncomingMessage, RawReaction};
use crate::engine::handlers::Dispatcher;
use crate::engine::permissions::Actor;
use crate::engine::validation;
use crate::platform::memory::MemoryPlatform;
use crate::platform::{ChannelId, MessageId};
use crate::store::GroupStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleParseError {
    #[error("empty line")]
    Empty,
    #[error("missing {0}")]
    MissingField(&'static str),
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Message {
        author: Actor,
        channel_id: ChannelId,
        content: String,
    },
    Reaction {
        emoji: String,
        member: Actor,
        channel_id: ChannelId,
        message_id: MessageId,
    },
}

impl ConsoleLine {
    pub fn parse(line: &str) -> Result<Self, ConsoleParseError> {
        let line = line.trim_end_matches(['\r', '\n']).trim_start();
        if line.is_empty() {
            return Err(ConsoleParseError::Empty);
        }

        if let Some(rest) = line.strip_prefix('+') {
            let mut fields = rest.split_whitespace();
            let emoji = fields.next().ok_or(ConsoleParseError::MissingField("emoji"))?;
            let member = parse_actor(fields.next())?;
            let channel_id = fields
                .next()
                .ok_or(ConsoleParseError::MissingField("channel"))?;
            let message_id = fields
                .next()
                .ok_or(ConsoleParseError::MissingField("message"))?;
            return Ok(ConsoleLine::Reaction {
                emoji: emoji.to_string(),
                member,
                channel_id: channel_id.to_string(),
                message_id: message_id.to_string(),
            });
        }

        let (user, rest) = split_word(line);
        let author = parse_actor(user)?;
        let (channel, content) = match rest {
            Some(rest) => split_word(rest),
            None => (None, None),
        };
        let channel_id = channel.ok_or(ConsoleParseError::MissingField("channel"))?;
        let content = content.ok_or(ConsoleParseError::MissingField("text"))?;

        Ok(ConsoleLine::Message {
            author,
            channel_id: channel_id.to_string(),
            content: content.to_string(),
        })
    }

    /// The acting user, for auto-registration on the platform.
    pub fn actor(&self) -> &Actor {
        match self {
            ConsoleLine::Message { author, .. } => author,
            ConsoleLine::Reaction { member, .. } => member,
        }
    }

    pub fn into_event(self, message_id: MessageId) -> BotEvent {
        match self {
            ConsoleLine::Message {
                author,
                channel_id,
                content,
            } => BotEvent::Message(IncomingMessage {
                id: message_id,
                channel_id,
                author,
                content,
            }),
            ConsoleLine::Reaction {
                emoji,
                member,
                channel_id,
                message_id,
            } => BotEvent::ReactionAdd(RawReaction {
                emoji,
                message_id,
                channel_id,
                member,
            }),
        }
    }
}

fn split_word(s: &str) -> (Option<&str>, Option<&str>) {
    let s = s.trim_start();
    if s.is_empty() {
        return (None, None);
    }
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => {
            let rest = rest.trim_start();
            (Some(word), (!rest.is_empty()).then_some(rest))
        }
        None => (Some(s), None),
    }
}

fn parse_actor(field: Option<&str>) -> Result<Actor, ConsoleParseError> {
    let field = field.ok_or(ConsoleParseError::MissingField("user"))?;
    let mut parts = field.split(',').filter(|p| !p.is_empty());
    let user_id = parts.next().ok_or(ConsoleParseError::MissingField("user"))?;
    Ok(Actor::new(user_id, parts.map(str::to_string).collect()))
}

/// Create the configured categories and channels, plus a channel for every
/// group already in the state document.
pub fn seed_platform(platform: &MemoryPlatform, config: &BotConfig, store: &GroupStore) {
    let lg = &config.learning_groups;
    platform.add_category(&lg.open_category, "Open learning groups");
    platform.add_category(&lg.closed_category, "Closed learning groups");
    platform.add_category(&lg.archive_category, "Archive");
    platform.add_channel(&lg.request_channel, "group-requests", None);
    platform.add_channel(&lg.info_channel, "learning-groups", None);

    for (channel_id, group) in store.groups() {
        let category = if group.is_open {
            &lg.open_category
        } else {
            &lg.closed_category
        };
        platform.add_channel(channel_id, &validation::canonical_name(group), Some(category));
    }
    info!(groups = store.groups().len(), "console platform seeded");
}

/// Read lines until EOF, handing each parsed one to the dispatcher task.
pub async fn run<R>(reader: R, dispatcher: Dispatcher, platform: Arc<MemoryPlatform>)
where
    R: AsyncBufRead + Unpin,
{
    let (tx, rx) = mpsc::unbounded_channel::<BotEvent>();
    let consumer = tokio::spawn(dispatcher.run(rx));

    let mut lines = reader.lines();
    let mut counter: u64 = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read console input");
                break;
            }
        };

        let parsed = match ConsoleLine::parse(&line) {
            Ok(parsed) => parsed,
            Err(ConsoleParseError::Empty) => continue,
            Err(e) => {
                warn!(%line, error = %e, "skipping console line");
                continue;
            }
        };

        let user_id = &parsed.actor().user_id;
        platform.add_user(user_id, user_id);
        counter += 1;
        if tx.send(parsed.into_event(format!("console-{counter}"))).is_err() {
            warn!("dispatcher stopped, discarding input");
            break;
        }
    }

    drop(tx);
    if let Err(e) = consumer.await {
        warn!(error = %e, "dispatcher task failed");
    }
}
