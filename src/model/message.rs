//! Chat message as handed over by the persistence layer once it is saved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a message author or of a livechat visitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Unique user identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Handle used in notification summaries (`@username`)
    pub username: String,
}

/// A mention reference carried by a message.
///
/// The identifier is either a user id or one of the broadcast tokens
/// `all` and `here`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    /// Mentioned user id, or a broadcast token
    #[serde(rename = "_id")]
    pub id: String,
    /// Username of the mentioned user
    #[serde(default)]
    pub username: String,
}

/// A persisted chat message.
///
/// The notification pipeline only ever reads a message; it is returned
/// unchanged to the save pipeline once notifications are dispatched.
///
/// # Examples
///
/// ```
/// use chime::model::{Message, Sender};
///
/// let message = Message::new("m1", "general", Sender {
///     id: "u1".to_string(),
///     username: "alice".to_string(),
/// }, "hello");
/// assert!(message.mentions.is_empty());
/// assert!(message.edited_at.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Identifier of the room the message was posted in
    pub rid: String,
    /// Message author
    pub u: Sender,
    /// Raw message text
    #[serde(default)]
    pub msg: String,
    /// Creation timestamp
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,
    /// Set when the message has been edited after creation
    #[serde(rename = "editedAt", default)]
    pub edited_at: Option<DateTime<Utc>>,
    /// Users and broadcast tokens mentioned in the text
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl Message {
    /// Creates a message stamped with the current time and no mentions.
    pub fn new(id: &str, rid: &str, author: Sender, msg: &str) -> Self {
        Message {
            id: id.to_owned(),
            rid: rid.to_owned(),
            u: author,
            msg: msg.to_owned(),
            ts: Some(Utc::now()),
            edited_at: None,
            mentions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_message() {
        let json = r#"{
            "_id": "m1",
            "rid": "r1",
            "u": {"_id": "u1", "username": "alice"},
            "msg": "hi @bob",
            "ts": "2024-05-01T10:00:00Z",
            "mentions": [{"_id": "u2", "username": "bob"}]
        }"#;

        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, "m1");
        assert_eq!(message.u.username, "alice");
        assert!(message.ts.is_some());
        assert!(message.edited_at.is_none());
        assert_eq!(message.mentions.len(), 1);
        assert_eq!(message.mentions[0].id, "u2");
    }

    #[test]
    fn test_deserialize_message_without_mentions() {
        let json = r#"{"_id": "m1", "rid": "r1", "u": {"_id": "u1", "username": "alice"}}"#;

        let message: Message = serde_json::from_str(json).unwrap();
        assert!(message.mentions.is_empty());
        assert!(message.ts.is_none());
        assert_eq!(message.msg, "");
    }
}
