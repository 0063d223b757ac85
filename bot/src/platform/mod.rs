//! The chat platform the bot runs on.
//!
//! The gateway connection itself lives outside this crate; everything the
//! lifecycle engine needs from it goes through [`ChatPlatform`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub type ChannelId = String;
pub type MessageId = String;
pub type UserId = String;
pub type RoleId = String;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("platform request failed: {0}")]
    Api(String),
}

impl PlatformError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// A text channel as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub category_id: Option<ChannelId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub embed: Option<Embed>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: String::new(),
            embed: Some(embed),
        }
    }
}

/// A message fetched back from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub content: String,
    pub embed: Option<Embed>,
}

/// Where a moved channel lands inside its new category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Before(ChannelId),
    End,
}

pub fn channel_mention(channel_id: &str) -> String {
    format!("<#{channel_id}>")
}

pub fn user_mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Channel, message and reaction primitives consumed by the engine.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Display name of a category.
    async fn category_name(&self, category_id: &str) -> Result<String, PlatformError>;

    /// Text channels of a category in display order.
    async fn category_channels(&self, category_id: &str)
    -> Result<Vec<ChannelInfo>, PlatformError>;

    async fn channel(&self, channel_id: &str) -> Result<ChannelInfo, PlatformError>;

    /// Create a text channel at the end of a category.
    async fn create_text_channel(
        &self,
        category_id: &str,
        name: &str,
    ) -> Result<ChannelInfo, PlatformError>;

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), PlatformError>;

    async fn move_channel(
        &self,
        channel_id: &str,
        category_id: &str,
        placement: Placement,
    ) -> Result<(), PlatformError>;

    async fn send_message(
        &self,
        channel_id: &str,
        message: OutgoingMessage,
    ) -> Result<MessageId, PlatformError>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<(), PlatformError>;

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<MessageInfo, PlatformError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str)
    -> Result<(), PlatformError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    /// Send a private message to a user.
    async fn send_dm(&self, user_id: &str, content: &str) -> Result<(), PlatformError>;

    async fn user_name(&self, user_id: &str) -> Result<String, PlatformError>;
}
