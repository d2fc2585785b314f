//! Per-room notification preferences of a user.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ModelError;

/// Notification preference of one channel.
///
/// `Default` defers to the operator's account-level default for the channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Default,
    All,
    Mentions,
    Nothing,
}

/// Notification channels, in the order they are evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Audio,
    Desktop,
    Push,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Channel::Audio => "audio",
            Channel::Desktop => "desktop",
            Channel::Push => "push",
            Channel::Email => "email",
        };
        write!(f, "{}", name)
    }
}

/// Reference to the user owning a subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// Join record between a user and a room.
///
/// There is at most one subscription per (room, user) pair. Records are created
/// and destroyed by the persistence layer; the notification pipeline only reads
/// them.
///
/// # Examples
///
/// ```
/// use chime::model::{Preference, Subscription};
///
/// let mut subscription = Subscription::new("general", "u2", "bob").unwrap();
/// subscription.desktop_notifications = Preference::Mentions;
/// assert!(!subscription.wants_all_messages());
///
/// assert!(Subscription::new("general", "", "nobody").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSubscription", rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    pub rid: String,
    pub u: SubscriptionUser,
    pub audio_notifications: Preference,
    pub desktop_notifications: Preference,
    pub mobile_push_notifications: Preference,
    pub email_notifications: Preference,
    /// Ignore `@all` and `@here` mentions
    pub mute_group_mentions: bool,
    /// Ignore every message of the room
    pub disable_notifications: bool,
    /// Users whose messages never notify this subscriber
    pub ignored: Vec<String>,
    /// Desktop notification display duration in seconds
    pub desktop_notification_duration: Option<u32>,
}

impl Subscription {
    /// Creates a subscription with every preference left to its default.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingUser`] when `user_id` is empty.
    pub fn new(rid: &str, user_id: &str, username: &str) -> Result<Self, ModelError> {
        if user_id.is_empty() {
            return Err(ModelError::MissingUser(rid.to_owned()));
        }

        Ok(Subscription {
            id: format!("{}{}", rid, user_id),
            rid: rid.to_owned(),
            u: SubscriptionUser {
                id: user_id.to_owned(),
                username: username.to_owned(),
            },
            audio_notifications: Preference::Default,
            desktop_notifications: Preference::Default,
            mobile_push_notifications: Preference::Default,
            email_notifications: Preference::Default,
            mute_group_mentions: false,
            disable_notifications: false,
            ignored: Vec::new(),
            desktop_notification_duration: None,
        })
    }

    /// Returns the preference set for `channel`.
    pub fn preference(&self, channel: Channel) -> Preference {
        match channel {
            Channel::Audio => self.audio_notifications,
            Channel::Desktop => self.desktop_notifications,
            Channel::Push => self.mobile_push_notifications,
            Channel::Email => self.email_notifications,
        }
    }

    /// Whether the subscriber opted into every message on at least one channel.
    ///
    /// These are the only subscribers loaded for rooms above the member cap.
    pub fn wants_all_messages(&self) -> bool {
        [
            Channel::Audio,
            Channel::Desktop,
            Channel::Push,
            Channel::Email,
        ]
        .iter()
        .any(|channel| self.preference(*channel) == Preference::All)
    }

    /// Whether the subscriber ignores messages from `user_id`.
    pub fn ignores(&self, user_id: &str) -> bool {
        self.ignored.iter().any(|ignored| ignored == user_id)
    }
}

/// Wire shape of a subscription, validated into [`Subscription`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubscription {
    #[serde(rename = "_id", default)]
    id: String,
    rid: String,
    u: SubscriptionUser,
    #[serde(default)]
    audio_notifications: Preference,
    #[serde(default)]
    desktop_notifications: Preference,
    #[serde(default)]
    mobile_push_notifications: Preference,
    #[serde(default)]
    email_notifications: Preference,
    #[serde(default)]
    mute_group_mentions: bool,
    #[serde(default)]
    disable_notifications: bool,
    #[serde(default)]
    ignored: Vec<String>,
    #[serde(default)]
    desktop_notification_duration: Option<u32>,
}

impl TryFrom<RawSubscription> for Subscription {
    type Error = ModelError;

    fn try_from(raw: RawSubscription) -> Result<Self, Self::Error> {
        let mut subscription = Subscription::new(&raw.rid, &raw.u.id, &raw.u.username)?;
        if !raw.id.is_empty() {
            subscription.id = raw.id;
        }
        subscription.audio_notifications = raw.audio_notifications;
        subscription.desktop_notifications = raw.desktop_notifications;
        subscription.mobile_push_notifications = raw.mobile_push_notifications;
        subscription.email_notifications = raw.email_notifications;
        subscription.mute_group_mentions = raw.mute_group_mentions;
        subscription.disable_notifications = raw.disable_notifications;
        subscription.ignored = raw.ignored;
        subscription.desktop_notification_duration = raw.desktop_notification_duration;
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_subscription() {
        let json = r#"{
            "_id": "s1",
            "rid": "r1",
            "u": {"_id": "u2", "username": "bob"},
            "desktopNotifications": "mentions",
            "mobilePushNotifications": "all",
            "muteGroupMentions": true,
            "ignored": ["u3"]
        }"#;

        let subscription: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(subscription.id, "s1");
        assert_eq!(subscription.audio_notifications, Preference::Default);
        assert_eq!(subscription.desktop_notifications, Preference::Mentions);
        assert_eq!(subscription.mobile_push_notifications, Preference::All);
        assert!(subscription.mute_group_mentions);
        assert!(subscription.ignores("u3"));
        assert!(!subscription.ignores("u1"));
        assert!(subscription.wants_all_messages());
    }

    #[test]
    fn test_deserialize_rejects_missing_user() {
        let json = r#"{"rid": "r1", "u": {"_id": ""}}"#;
        assert!(serde_json::from_str::<Subscription>(json).is_err());
    }

    #[test]
    fn test_unknown_preference_is_rejected() {
        let json = r#"{"rid": "r1", "u": {"_id": "u1"}, "emailNotifications": "sometimes"}"#;
        assert!(serde_json::from_str::<Subscription>(json).is_err());
    }

    #[test]
    fn test_preference_per_channel() {
        let mut subscription = Subscription::new("r1", "u1", "alice").unwrap();
        subscription.email_notifications = Preference::Nothing;

        assert_eq!(subscription.preference(Channel::Email), Preference::Nothing);
        assert_eq!(subscription.preference(Channel::Audio), Preference::Default);
        assert!(!subscription.wants_all_messages());
    }
}
