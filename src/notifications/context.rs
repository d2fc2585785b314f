//! Data shared by every subscriber of one fan-out.

use crate::{
    model::{Channel, Message, Preference, Room, RoomType, Sender},
    notifications::mentions::{MentionSet, resolve_mentions},
    services::{Presenter, Settings},
};

/// Push body sent when the operator hides message content.
pub const HIDDEN_PUSH_BODY: &str = " ";

/// Account-level preference per channel, applied to `Default` subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultPreferences {
    pub audio: Preference,
    pub desktop: Preference,
    pub push: Preference,
    pub email: Preference,
}

impl DefaultPreferences {
    /// Reads the defaults of every channel from the settings.
    pub fn from_settings(settings: &dyn Settings) -> Self {
        DefaultPreferences {
            audio: settings.default_preference(Channel::Audio),
            desktop: settings.default_preference(Channel::Desktop),
            push: settings.default_preference(Channel::Push),
            email: settings.default_preference(Channel::Email),
        }
    }

    pub fn get(&self, channel: Channel) -> Preference {
        match channel {
            Channel::Audio => self.audio,
            Channel::Desktop => self.desktop,
            Channel::Push => self.push,
            Channel::Email => self.email,
        }
    }
}

/// Push texts, redacted according to the operator's preview settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushContent {
    /// Message preview, or [`HIDDEN_PUSH_BODY`]
    pub body: String,
    /// Sender username, or empty
    pub username: String,
    /// `#room` label, or empty
    pub room_label: String,
}

/// Per-message context computed once and shared by every subscriber.
#[derive(Clone, Debug)]
pub struct NotificationContext {
    pub mentions: MentionSet,
    /// The room is above the member cap: `Default` preferences never fire
    pub disable_all_message_notifications: bool,
    pub always_notify_mobile: bool,
    pub push: PushContent,
    pub defaults: DefaultPreferences,
    pub site_url: String,
}

impl NotificationContext {
    /// Builds the context of `message`.
    ///
    /// Settings are read here, once per fan-out, so a whole fan-out sees a
    /// consistent configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        message: &Message,
        room: &Room,
        room_type: RoomType,
        sender: &Sender,
        acting_user_id: &str,
        disable_all_message_notifications: bool,
        settings: &dyn Settings,
        presenter: &dyn Presenter,
    ) -> Self {
        let body = if settings.push_show_message() {
            presenter.render_push_body(message, acting_user_id)
        } else {
            HIDDEN_PUSH_BODY.to_owned()
        };

        let (username, room_label) = if settings.push_show_username_room() {
            (
                sender.username.clone(),
                format!("#{}", presenter.resolve_room_display_name(room_type, room)),
            )
        } else {
            (String::new(), String::new())
        };

        NotificationContext {
            mentions: resolve_mentions(&message.mentions),
            disable_all_message_notifications,
            always_notify_mobile: settings.always_notify_mobile(),
            push: PushContent {
                body,
                username,
                room_label,
            },
            defaults: DefaultPreferences::from_settings(settings),
            site_url: settings.site_url(),
        }
    }

    /// Returns a copy with room suppression lifted, used for auto-joined users.
    pub fn unsuppressed(&self) -> Self {
        NotificationContext {
            disable_all_message_notifications: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mention;
    use crate::services::{MockPresenter, MockSettings};
    use mockall::predicate::eq;

    fn settings(show_message: bool, show_identity: bool) -> MockSettings {
        let mut settings = MockSettings::new();
        settings
            .expect_push_show_message()
            .return_const(show_message);
        settings
            .expect_push_show_username_room()
            .return_const(show_identity);
        settings.expect_always_notify_mobile().return_const(false);
        settings
            .expect_default_preference()
            .returning(|_| Preference::Mentions);
        settings
            .expect_site_url()
            .returning(|| "https://chat.example.com".to_string());
        settings
    }

    fn fixtures() -> (Message, Room, Sender) {
        let sender = Sender {
            id: "u1".to_string(),
            username: "alice".to_string(),
        };
        let mut message = Message::new("m1", "r1", sender.clone(), "secret plans");
        message.mentions = vec![Mention {
            id: "here".to_string(),
            username: "here".to_string(),
        }];
        let room = Room::new("r1", RoomType::Channel, "general", &["alice", "bob"]);
        (message, room, sender)
    }

    #[test]
    fn test_hidden_push_content() {
        let (message, room, sender) = fixtures();
        let settings = settings(false, false);
        let mut presenter = MockPresenter::new();
        presenter.expect_render_push_body().never();
        presenter.expect_resolve_room_display_name().never();

        let context = NotificationContext::build(
            &message,
            &room,
            RoomType::Channel,
            &sender,
            "u1",
            false,
            &settings,
            &presenter,
        );

        assert_eq!(context.push.body, HIDDEN_PUSH_BODY);
        assert_eq!(context.push.username, "");
        assert_eq!(context.push.room_label, "");
        assert!(context.mentions.to_here);
        assert_eq!(context.site_url, "https://chat.example.com");
        assert_eq!(context.defaults.get(Channel::Email), Preference::Mentions);
    }

    #[test]
    fn test_visible_push_content() {
        let (message, room, sender) = fixtures();
        let settings = settings(true, true);
        let mut presenter = MockPresenter::new();
        presenter
            .expect_render_push_body()
            .withf(|message, viewer| message.id == "m1" && viewer == "u1")
            .times(1)
            .returning(|message, _| message.msg.clone());
        presenter
            .expect_resolve_room_display_name()
            .with(eq(RoomType::Channel), mockall::predicate::always())
            .times(1)
            .returning(|_, room| room.name.clone());

        let context = NotificationContext::build(
            &message,
            &room,
            RoomType::Channel,
            &sender,
            "u1",
            true,
            &settings,
            &presenter,
        );

        assert_eq!(context.push.body, "secret plans");
        assert_eq!(context.push.username, "alice");
        assert_eq!(context.push.room_label, "#general");
        assert!(context.disable_all_message_notifications);
        assert!(!context.unsuppressed().disable_all_message_notifications);
    }
}
