use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use super::{
    ChannelId, ChannelInfo, ChatPlatform, Embed, MessageId, MessageInfo, OutgoingMessage,
    Placement, PlatformError, UserId,
};

/// A side effect performed against the platform, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    CreateChannel {
        category_id: ChannelId,
        name: String,
    },
    RenameChannel {
        channel_id: ChannelId,
        name: String,
    },
    MoveChannel {
        channel_id: ChannelId,
        category_id: ChannelId,
        placement: Placement,
    },
    SendMessage {
        channel_id: ChannelId,
        message: OutgoingMessage,
    },
    EditMessage {
        channel_id: ChannelId,
        message_id: MessageId,
        content: String,
    },
    DeleteMessage {
        channel_id: ChannelId,
        message_id: MessageId,
    },
    AddReaction {
        message_id: MessageId,
        emoji: String,
    },
    SendDm {
        user_id: UserId,
        content: String,
    },
}

struct Category {
    name: String,
    channels: Vec<ChannelId>,
}

struct Channel {
    name: String,
    category_id: Option<ChannelId>,
}

struct StoredMessage {
    channel_id: ChannelId,
    content: String,
    embed: Option<Embed>,
    reactions: Vec<String>,
}

/// In-process platform: keeps categories, channels and messages in memory and
/// records every mutating call. Backs the console driver and the tests.
pub struct MemoryPlatform {
    categories: DashMap<ChannelId, Category>,
    channels: DashMap<ChannelId, Channel>,
    messages: DashMap<MessageId, StoredMessage>,
    users: DashMap<UserId, String>,
    calls: Mutex<Vec<PlatformCall>>,
    next_id: AtomicU64,
    refuse_renames: AtomicBool,
    refuse_reactions: AtomicBool,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self {
            categories: DashMap::new(),
            channels: DashMap::new(),
            messages: DashMap::new(),
            users: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1_000_000),
            refuse_renames: AtomicBool::new(false),
            refuse_reactions: AtomicBool::new(false),
        }
    }

    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }

    // ── Setup ───────────────────────────────────────────────────────

    pub fn add_category(&self, id: &str, name: &str) {
        self.categories.insert(
            id.to_string(),
            Category {
                name: name.to_string(),
                channels: Vec::new(),
            },
        );
    }

    /// Add a channel without recording a call. With a category, the channel
    /// is appended to that category's order.
    pub fn add_channel(&self, id: &str, name: &str, category_id: Option<&str>) {
        if let Some(cat_id) = category_id
            && let Some(mut cat) = self.categories.get_mut(cat_id)
        {
            cat.channels.push(id.to_string());
        }
        self.channels.insert(
            id.to_string(),
            Channel {
                name: name.to_string(),
                category_id: category_id.map(str::to_string),
            },
        );
    }

    pub fn add_user(&self, id: &str, name: &str) {
        self.users.insert(id.to_string(), name.to_string());
    }

    /// Make every rename fail with an API error, as when the platform's own
    /// rename limit kicks in.
    pub fn refuse_renames(&self, refuse: bool) {
        self.refuse_renames.store(refuse, Ordering::Relaxed);
    }

    pub fn refuse_reactions(&self, refuse: bool) {
        self.refuse_reactions.store(refuse, Ordering::Relaxed);
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Names of a category's channels in display order.
    pub fn channel_names_in(&self, category_id: &str) -> Vec<String> {
        let ids = self
            .categories
            .get(category_id)
            .map(|c| c.channels.clone())
            .unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.channels.get(id).map(|c| c.name.clone()))
            .collect()
    }

    pub fn channel_name(&self, channel_id: &str) -> Option<String> {
        self.channels.get(channel_id).map(|c| c.name.clone())
    }

    pub fn message(&self, message_id: &str) -> Option<MessageInfo> {
        self.messages.get(message_id).map(|m| MessageInfo {
            id: message_id.to_string(),
            channel_id: m.channel_id.clone(),
            content: m.content.clone(),
            embed: m.embed.clone(),
        })
    }

    pub fn messages_in(&self, channel_id: &str) -> Vec<MessageInfo> {
        let mut ids: Vec<MessageId> = self
            .messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.key().clone())
            .collect();
        ids.sort_by_key(|id| id.parse::<u64>().unwrap_or(u64::MAX));
        ids.iter().filter_map(|id| self.message(id)).collect()
    }

    pub fn reactions(&self, message_id: &str) -> Vec<String> {
        self.messages
            .get(message_id)
            .map(|m| m.reactions.clone())
            .unwrap_or_default()
    }

    pub fn dms_to(&self, user_id: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::SendDm { user_id: to, content } if to == user_id => {
                    Some(content.clone())
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatPlatform for MemoryPlatform {
    async fn category_name(&self, category_id: &str) -> Result<String, PlatformError> {
        self.categories
            .get(category_id)
            .map(|c| c.name.clone())
            .ok_or_else(|| PlatformError::not_found("category", category_id))
    }

    async fn category_channels(
        &self,
        category_id: &str,
    ) -> Result<Vec<ChannelInfo>, PlatformError> {
        let ids = self
            .categories
            .get(category_id)
            .map(|c| c.channels.clone())
            .ok_or_else(|| PlatformError::not_found("category", category_id))?;

        Ok(ids
            .into_iter()
            .filter_map(|id| {
                self.channels.get(&id).map(|c| ChannelInfo {
                    name: c.name.clone(),
                    category_id: c.category_id.clone(),
                    id,
                })
            })
            .collect())
    }

    async fn channel(&self, channel_id: &str) -> Result<ChannelInfo, PlatformError> {
        self.channels
            .get(channel_id)
            .map(|c| ChannelInfo {
                id: channel_id.to_string(),
                name: c.name.clone(),
                category_id: c.category_id.clone(),
            })
            .ok_or_else(|| PlatformError::not_found("channel", channel_id))
    }

    async fn create_text_channel(
        &self,
        category_id: &str,
        name: &str,
    ) -> Result<ChannelInfo, PlatformError> {
        if !self.categories.contains_key(category_id) {
            return Err(PlatformError::not_found("category", category_id));
        }
        let id = self.next_id();
        self.add_channel(&id, name, Some(category_id));
        self.record(PlatformCall::CreateChannel {
            category_id: category_id.to_string(),
            name: name.to_string(),
        });
        info!(channel_id = %id, %name, "channel created");

        Ok(ChannelInfo {
            id,
            name: name.to_string(),
            category_id: Some(category_id.to_string()),
        })
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<(), PlatformError> {
        if self.refuse_renames.load(Ordering::Relaxed) {
            return Err(PlatformError::Api("rename refused".into()));
        }
        let mut channel = self
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| PlatformError::not_found("channel", channel_id))?;
        channel.name = name.to_string();
        drop(channel);

        self.record(PlatformCall::RenameChannel {
            channel_id: channel_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn move_channel(
        &self,
        channel_id: &str,
        category_id: &str,
        placement: Placement,
    ) -> Result<(), PlatformError> {
        if !self.categories.contains_key(category_id) {
            return Err(PlatformError::not_found("category", category_id));
        }
        let old_category = self
            .channels
            .get(channel_id)
            .map(|c| c.category_id.clone())
            .ok_or_else(|| PlatformError::not_found("channel", channel_id))?;

        if let Some(old) = old_category
            && let Some(mut cat) = self.categories.get_mut(&old)
        {
            cat.channels.retain(|id| id != channel_id);
        }

        if let Some(mut cat) = self.categories.get_mut(category_id) {
            let index = match &placement {
                Placement::Before(sibling) => cat.channels.iter().position(|id| id == sibling),
                Placement::End => None,
            };
            match index {
                Some(i) => cat.channels.insert(i, channel_id.to_string()),
                None => cat.channels.push(channel_id.to_string()),
            }
        }

        if let Some(mut channel) = self.channels.get_mut(channel_id) {
            channel.category_id = Some(category_id.to_string());
        }

        self.record(PlatformCall::MoveChannel {
            channel_id: channel_id.to_string(),
            category_id: category_id.to_string(),
            placement,
        });
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: OutgoingMessage,
    ) -> Result<MessageId, PlatformError> {
        if !self.channels.contains_key(channel_id) {
            return Err(PlatformError::not_found("channel", channel_id));
        }
        let id = self.next_id();
        self.messages.insert(
            id.clone(),
            StoredMessage {
                channel_id: channel_id.to_string(),
                content: message.content.clone(),
                embed: message.embed.clone(),
                reactions: Vec::new(),
            },
        );
        match &message.embed {
            Some(embed) => info!(%channel_id, message_id = %id, title = %embed.title, "{}", embed.description),
            None => info!(%channel_id, message_id = %id, "{}", message.content),
        }
        self.record(PlatformCall::SendMessage {
            channel_id: channel_id.to_string(),
            message,
        });
        Ok(id)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<(), PlatformError> {
        let mut message = self
            .messages
            .get_mut(message_id)
            .filter(|m| m.channel_id == channel_id)
            .ok_or_else(|| PlatformError::not_found("message", message_id))?;
        message.content = content.to_string();
        drop(message);

        info!(%channel_id, %message_id, "(edited) {content}");
        self.record(PlatformCall::EditMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<MessageInfo, PlatformError> {
        self.message(message_id)
            .filter(|m| m.channel_id == channel_id)
            .ok_or_else(|| PlatformError::not_found("message", message_id))
    }

    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), PlatformError> {
        self.messages
            .remove_if(message_id, |_, m| m.channel_id == channel_id)
            .ok_or_else(|| PlatformError::not_found("message", message_id))?;

        self.record(PlatformCall::DeleteMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        if self.refuse_reactions.load(Ordering::Relaxed) {
            return Err(PlatformError::Api("reaction refused".into()));
        }
        let mut message = self
            .messages
            .get_mut(message_id)
            .filter(|m| m.channel_id == channel_id)
            .ok_or_else(|| PlatformError::not_found("message", message_id))?;
        message.reactions.push(emoji.to_string());
        drop(message);

        self.record(PlatformCall::AddReaction {
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn send_dm(&self, user_id: &str, content: &str) -> Result<(), PlatformError> {
        info!(%user_id, "(dm) {content}");
        self.record(PlatformCall::SendDm {
            user_id: user_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn user_name(&self, user_id: &str) -> Result<String, PlatformError> {
        self.users
            .get(user_id)
            .map(|u| u.value().clone())
            .ok_or_else(|| PlatformError::not_found("user", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> MemoryPlatform {
        let p = MemoryPlatform::new();
        p.add_category("open", "Open groups");
        p.add_category("closed", "Closed groups");
        p.add_channel("a", "🌲1000-a-sose22", Some("open"));
        p.add_channel("c", "🌲1000-c-sose22", Some("open"));
        p
    }

    #[tokio::test]
    async fn test_setup_is_not_recorded() {
        let p = platform();
        assert_eq!(p.call_count(), 0);
        assert_eq!(p.channel_names_in("open"), vec!["🌲1000-a-sose22", "🌲1000-c-sose22"]);
    }

    #[tokio::test]
    async fn test_move_before_sibling() {
        let p = platform();
        let b = p.create_text_channel("closed", "🌲1000-b-sose22").await.unwrap();
        p.move_channel(&b.id, "open", Placement::Before("c".into()))
            .await
            .unwrap();

        assert_eq!(
            p.channel_names_in("open"),
            vec!["🌲1000-a-sose22", "🌲1000-b-sose22", "🌲1000-c-sose22"]
        );
        assert!(p.channel_names_in("closed").is_empty());
        let moved = p.channel(&b.id).await.unwrap();
        assert_eq!(moved.category_id.as_deref(), Some("open"));
    }

    #[tokio::test]
    async fn test_move_to_end() {
        let p = platform();
        p.move_channel("a", "open", Placement::End).await.unwrap();
        assert_eq!(p.channel_names_in("open"), vec!["🌲1000-c-sose22", "🌲1000-a-sose22"]);
    }

    #[tokio::test]
    async fn test_messages_edit_and_delete() {
        let p = platform();
        let id = p.send_message("a", OutgoingMessage::text("hello")).await.unwrap();
        p.edit_message("a", &id, "bye").await.unwrap();
        assert_eq!(p.fetch_message("a", &id).await.unwrap().content, "bye");

        assert!(p.edit_message("c", &id, "wrong channel").await.is_err());

        p.delete_message("a", &id).await.unwrap();
        let err = p.fetch_message("a", &id).await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { kind: "message", .. }));
        assert_eq!(p.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_category_is_not_found() {
        let p = platform();
        assert!(p.create_text_channel("nope", "x").await.is_err());
        assert!(p.category_channels("nope").await.is_err());
        assert_eq!(p.call_count(), 0);
    }

    #[tokio::test]
    async fn test_dms_are_recorded_per_user() {
        let p = platform();
        p.send_dm("1", "one").await.unwrap();
        p.send_dm("2", "two").await.unwrap();
        assert_eq!(p.dms_to("1"), vec!["one"]);
    }
}
