//! Configuration file structures for chime.
//!
//! The configuration is split into two sections: notification rules applied by
//! the fan-out, and the delivery gateway the notifications are handed to.
//!
//! # Configuration File Format
//!
//! ```yaml
//! notifications:
//!   # Above this member count only all-messages subscribers are notified (0 = no cap)
//!   max_room_members: 500
//!   # Push even to users with a live connection
//!   always_notify_mobile: false
//!   # Include the message text in pushes
//!   push_show_message: true
//!   # Include the sender username and room name in pushes
//!   push_show_username_room: true
//!   # Account defaults used when a subscription leaves a channel to default
//!   defaults:
//!     audio: nothing
//!     desktop: mentions
//!     push: mentions
//!     email: mentions
//!
//! gateway:
//!   # Delivery gateway base url
//!   url: "http://localhost:8080"
//!   # Public url of the chat server, sent along with pushes
//!   site_url: "https://chat.example.com"
//! ```
//!
//! Every field except `gateway.url` has a default.
//!
//! # Environment Variable Overrides
//!
//! Any value can be overridden with the `CHIME_` prefix, sections being
//! separated by a double underscore:
//!
//! ```bash
//! export CHIME_GATEWAY__URL="http://gateway:8080"
//! export CHIME_NOTIFICATIONS__MAX_ROOM_MEMBERS=1000
//! export CHIME_NOTIFICATIONS__DEFAULTS__AUDIO=all
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

use crate::{
    model::{Channel, Preference},
    services::Settings,
};

/// Root configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Notification rules
    #[serde(default)]
    pub notifications: Notifications,
    /// Delivery gateway
    pub gateway: Gateway,
}

/// Notification rules read by every fan-out.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Notifications {
    /// Member count above which only subscribers opted into every message are notified.
    ///
    /// `0` disables the cap.
    pub max_room_members: usize,
    /// Push to users with a live connection too.
    pub always_notify_mobile: bool,
    /// Include the message text in push bodies.
    pub push_show_message: bool,
    /// Include the sender username and the room name in pushes.
    pub push_show_username_room: bool,
    /// Account defaults per channel.
    pub defaults: Defaults,
}

impl Default for Notifications {
    fn default() -> Self {
        Notifications {
            max_room_members: 500,
            always_notify_mobile: false,
            push_show_message: true,
            push_show_username_room: true,
            defaults: Defaults::default(),
        }
    }
}

/// Preference applied to a channel a subscription left to default.
///
/// A `default` value here behaves like `nothing`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub audio: Preference,
    pub desktop: Preference,
    pub push: Preference,
    pub email: Preference,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            audio: Preference::Nothing,
            desktop: Preference::Mentions,
            push: Preference::Mentions,
            email: Preference::Mentions,
        }
    }
}

/// Delivery gateway configuration.
#[derive(Debug, Deserialize)]
pub struct Gateway {
    /// Base URL of the delivery gateway.
    ///
    /// Should include the protocol (http/https). A trailing slash is ignored.
    pub url: String,

    /// Public URL of the chat server, used as push host.
    #[serde(default)]
    pub site_url: String,
}

impl Config {
    /// Loads the configuration from a YAML file, then applies `CHIME_` environment overrides.
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("CHIME_").split("__"))
            .extract()
    }
}

impl Settings for Config {
    fn max_room_members_for_notification(&self) -> usize {
        self.notifications.max_room_members
    }

    fn always_notify_mobile(&self) -> bool {
        self.notifications.always_notify_mobile
    }

    fn push_show_message(&self) -> bool {
        self.notifications.push_show_message
    }

    fn push_show_username_room(&self) -> bool {
        self.notifications.push_show_username_room
    }

    fn default_preference(&self, channel: Channel) -> Preference {
        let defaults = &self.notifications.defaults;
        match channel {
            Channel::Audio => defaults.audio,
            Channel::Desktop => defaults.desktop,
            Channel::Push => defaults.push,
            Channel::Email => defaults.email,
        }
    }

    fn site_url(&self) -> String {
        self.gateway.site_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_full_config() {
        let file = config_file(
            r#"
notifications:
  max_room_members: 50
  always_notify_mobile: true
  push_show_message: false
  push_show_username_room: false
  defaults:
    audio: all
    desktop: nothing
    push: all
    email: nothing
gateway:
  url: "http://gateway.local"
  site_url: "https://chat.example.com"
"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.max_room_members_for_notification(), 50);
        assert!(config.always_notify_mobile());
        assert!(!config.push_show_message());
        assert!(!config.push_show_username_room());
        assert_eq!(config.default_preference(Channel::Audio), Preference::All);
        assert_eq!(
            config.default_preference(Channel::Desktop),
            Preference::Nothing
        );
        assert_eq!(config.gateway.url, "http://gateway.local");
        assert_eq!(config.site_url(), "https://chat.example.com");
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let file = config_file("gateway:\n  url: \"http://gateway.local\"\n");

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.max_room_members_for_notification(), 500);
        assert!(!config.always_notify_mobile());
        assert!(config.push_show_message());
        assert_eq!(
            config.default_preference(Channel::Audio),
            Preference::Nothing
        );
        assert_eq!(
            config.default_preference(Channel::Email),
            Preference::Mentions
        );
        assert_eq!(config.site_url(), "");
    }

    #[test]
    #[serial]
    fn test_missing_gateway() {
        let file = config_file("notifications:\n  max_room_members: 10\n");
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let file = config_file("gateway:\n  url: \"http://gateway.local\"\n");

        // SAFETY: env mutation is serialized by #[serial]
        unsafe {
            std::env::set_var("CHIME_GATEWAY__URL", "http://override.local");
            std::env::set_var("CHIME_NOTIFICATIONS__MAX_ROOM_MEMBERS", "1000");
            std::env::set_var("CHIME_NOTIFICATIONS__DEFAULTS__AUDIO", "all");
        }

        let config = Config::load(file.path().to_str().unwrap());

        unsafe {
            std::env::remove_var("CHIME_GATEWAY__URL");
            std::env::remove_var("CHIME_NOTIFICATIONS__MAX_ROOM_MEMBERS");
            std::env::remove_var("CHIME_NOTIFICATIONS__DEFAULTS__AUDIO");
        }

        let config = config.unwrap();
        assert_eq!(config.gateway.url, "http://override.local");
        assert_eq!(config.max_room_members_for_notification(), 1000);
        assert_eq!(config.default_preference(Channel::Audio), Preference::All);
    }
}
