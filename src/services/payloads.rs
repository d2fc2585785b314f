//! Payloads handed to the delivery transports.

use serde::Serialize;

use crate::model::{Message, Room, RoomType, Sender, Subscription, User};

/// Routing data attached to a push so the mobile client can open the room.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PushPayload {
    /// Public url of the chat server
    pub host: String,
    pub rid: String,
    pub sender: Sender,
    #[serde(rename = "type")]
    pub room_type: Option<RoomType>,
    pub name: String,
}

/// A mobile push for one receiver.
///
/// `room_name`, `username` and `message` are already redacted according to the
/// operator's push preview settings.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotification {
    pub room: Room,
    pub room_id: String,
    pub room_name: String,
    pub username: String,
    pub message: String,
    pub payload: PushPayload,
    pub user_id: String,
    pub receiver_username: String,
}

/// An email for one receiver, sent to a single verified address.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotification {
    pub message: Message,
    pub receiver: User,
    pub subscription: Subscription,
    pub room: Room,
    pub email_address: String,
}

/// Event kind reported to the platform attention hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttentionKind {
    /// Message posted in a private group
    PrivateMessage,
    /// Any other message
    Message,
}

impl AttentionKind {
    /// Picks the event kind for a message posted in a room of `room_type`.
    pub fn for_room(room_type: Option<RoomType>) -> Self {
        match room_type {
            Some(RoomType::Private) => AttentionKind::PrivateMessage,
            _ => AttentionKind::Message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attention_kind_for_room() {
        assert_eq!(
            AttentionKind::for_room(Some(RoomType::Private)),
            AttentionKind::PrivateMessage
        );
        assert_eq!(
            AttentionKind::for_room(Some(RoomType::Channel)),
            AttentionKind::Message
        );
        assert_eq!(
            AttentionKind::for_room(Some(RoomType::Direct)),
            AttentionKind::Message
        );
    }

    #[test]
    fn test_push_payload_serialization() {
        let payload = PushPayload {
            host: "https://chat.example.com".to_string(),
            rid: "r1".to_string(),
            sender: Sender {
                id: "u1".to_string(),
                username: "alice".to_string(),
            },
            room_type: Some(RoomType::Channel),
            name: "general".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "c");
        assert_eq!(json["sender"]["_id"], "u1");
        assert_eq!(json["host"], "https://chat.example.com");
    }
}
