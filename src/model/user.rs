//! Receiver of notifications.

use serde::{Deserialize, Serialize};

/// Presence status chosen by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Away,
    Busy,
    #[default]
    Offline,
}

/// State of the user's live client connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Online,
    Away,
    Offline,
}

/// An email address of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    #[serde(default)]
    pub verified: bool,
}

/// A user account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    /// Deactivated users never receive notifications
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub status_connection: Option<ConnectionStatus>,
    #[serde(default)]
    pub emails: Vec<Email>,
    /// Personal keywords that count as a mention when found in a message
    #[serde(default)]
    pub highlights: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Creates an active, offline user without emails or highlights.
    pub fn new(id: &str, username: &str) -> Self {
        User {
            id: id.to_owned(),
            username: username.to_owned(),
            active: true,
            status: UserStatus::Offline,
            status_connection: None,
            emails: Vec::new(),
            highlights: Vec::new(),
        }
    }

    /// Whether a client of the user is currently connected and active.
    pub fn has_live_connection(&self) -> bool {
        self.status_connection == Some(ConnectionStatus::Online)
    }

    /// Returns the first verified email address, if any.
    pub fn first_verified_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|email| email.verified)
            .map(|email| email.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(address: &str, verified: bool) -> Email {
        Email {
            address: address.to_string(),
            verified,
        }
    }

    #[test]
    fn test_first_verified_email() {
        let mut user = User::new("u1", "alice");
        assert_eq!(user.first_verified_email(), None);

        user.emails = vec![
            email("old@example.com", false),
            email("main@example.com", true),
            email("other@example.com", true),
        ];
        assert_eq!(user.first_verified_email(), Some("main@example.com"));
    }

    #[test]
    fn test_live_connection() {
        let mut user = User::new("u1", "alice");
        assert!(!user.has_live_connection());

        user.status_connection = Some(ConnectionStatus::Away);
        assert!(!user.has_live_connection());

        user.status_connection = Some(ConnectionStatus::Online);
        assert!(user.has_live_connection());
    }

    #[test]
    fn test_deserialize_user_defaults() {
        let user: User = serde_json::from_str(r#"{"_id": "u1", "username": "alice"}"#).unwrap();
        assert!(user.active);
        assert_eq!(user.status, UserStatus::Offline);
        assert!(user.status_connection.is_none());

        let user: User = serde_json::from_str(
            r#"{"_id": "u1", "username": "alice", "status": "busy", "statusConnection": "online"}"#,
        )
        .unwrap();
        assert_eq!(user.status, UserStatus::Busy);
        assert!(user.has_live_connection());
    }
}
