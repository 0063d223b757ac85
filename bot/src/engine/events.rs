use super::permissions::Actor;
use crate::platform::{ChannelId, MessageId, MessageInfo};

/// Title of the embed posted for every group request.
pub const REQUEST_TITLE: &str = "Learning group request";

pub const APPROVE_EMOJI: &str = "👍";
pub const DISCARD_EMOJI: &str = "🗑️";

/// An inbound event from the platform. Handled one at a time, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    Message(IncomingMessage),
    ReactionAdd(RawReaction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: Actor,
    pub content: String,
}

/// A reaction as delivered by the gateway, before the message is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReaction {
    pub emoji: String,
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub member: Actor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    GroupRequest,
    Other,
}

pub fn message_kind(message: &MessageInfo) -> MessageKind {
    match &message.embed {
        Some(embed) if embed.title == REQUEST_TITLE => MessageKind::GroupRequest,
        _ => MessageKind::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    ApproveRequest,
    DiscardRequest,
}

/// Reaction dispatch table, keyed by (emoji, message kind).
pub fn reaction_action(emoji: &str, kind: MessageKind) -> Option<ReactionAction> {
    match (emoji, kind) {
        (APPROVE_EMOJI, MessageKind::GroupRequest) => Some(ReactionAction::ApproveRequest),
        (DISCARD_EMOJI, MessageKind::GroupRequest) => Some(ReactionAction::DiscardRequest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Embed;

    fn message(title: Option<&str>) -> MessageInfo {
        MessageInfo {
            id: "1".into(),
            channel_id: "2".into(),
            content: String::new(),
            embed: title.map(|t| Embed {
                title: t.into(),
                description: String::new(),
                color: 0,
            }),
        }
    }

    #[test]
    fn test_message_kind() {
        assert_eq!(message_kind(&message(Some(REQUEST_TITLE))), MessageKind::GroupRequest);
        assert_eq!(message_kind(&message(Some("Something else"))), MessageKind::Other);
        assert_eq!(message_kind(&message(None)), MessageKind::Other);
    }

    #[test]
    fn test_reaction_table() {
        assert_eq!(
            reaction_action("👍", MessageKind::GroupRequest),
            Some(ReactionAction::ApproveRequest)
        );
        assert_eq!(
            reaction_action("🗑️", MessageKind::GroupRequest),
            Some(ReactionAction::DiscardRequest)
        );
        assert_eq!(reaction_action("👍", MessageKind::Other), None);
        assert_eq!(reaction_action("❤️", MessageKind::GroupRequest), None);
    }
}
