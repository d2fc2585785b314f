//! Per-channel eligibility rules.
//!
//! Each channel has its own input struct carrying only the fields that channel
//! looks at, so every rule can be read and tested on its own.
//!
//! A [`Preference::Default`] is first resolved against the operator's
//! account-level default for the channel. In a suppressed room (above the
//! member cap) a `Default` preference never fires: only explicit opt-ins do.

use crate::model::{Preference, UserStatus};

/// Input of [`should_notify_audio`].
#[derive(Clone, Copy, Debug)]
pub struct AudioInput {
    pub disable_all_message_notifications: bool,
    pub status: UserStatus,
    pub preference: Preference,
    pub default_preference: Preference,
    pub to_all: bool,
    pub to_here: bool,
    pub is_highlighted: bool,
    pub is_mentioned: bool,
}

/// Input of [`should_notify_desktop`].
#[derive(Clone, Copy, Debug)]
pub struct DesktopInput {
    pub disable_all_message_notifications: bool,
    pub status: UserStatus,
    pub preference: Preference,
    pub default_preference: Preference,
    pub to_all: bool,
    pub to_here: bool,
    pub is_highlighted: bool,
    pub is_mentioned: bool,
}

/// Input of [`should_notify_mobile`].
#[derive(Clone, Copy, Debug)]
pub struct MobileInput {
    pub disable_all_message_notifications: bool,
    pub preference: Preference,
    pub default_preference: Preference,
    pub to_all: bool,
    pub is_highlighted: bool,
    pub is_mentioned: bool,
    pub always_notify_mobile: bool,
    pub has_live_connection: bool,
}

/// Input of [`should_notify_email`].
#[derive(Clone, Copy, Debug)]
pub struct EmailInput {
    pub disable_all_message_notifications: bool,
    pub preference: Preference,
    pub default_preference: Preference,
    pub is_highlighted: bool,
    pub is_mentioned: bool,
    pub has_live_connection: bool,
}

/// Resolves the preference actually applied to a channel.
///
/// Never returns [`Preference::Default`]: an unresolvable default is `Nothing`.
fn effective_preference(preference: Preference, default_preference: Preference, suppressed: bool) -> Preference {
    match preference {
        Preference::Default if suppressed => Preference::Nothing,
        Preference::Default => match default_preference {
            Preference::Default => Preference::Nothing,
            resolved => resolved,
        },
        explicit => explicit,
    }
}

/// Decides whether an audio cue plays for the receiver.
///
/// Busy receivers never get one.
pub fn should_notify_audio(input: &AudioInput) -> bool {
    if input.status == UserStatus::Busy {
        return false;
    }

    match effective_preference(
        input.preference,
        input.default_preference,
        input.disable_all_message_notifications,
    ) {
        Preference::All => true,
        Preference::Mentions => {
            input.to_all || input.to_here || input.is_highlighted || input.is_mentioned
        }
        Preference::Nothing | Preference::Default => false,
    }
}

/// Decides whether a desktop notification is shown to the receiver.
///
/// Busy receivers never get one.
pub fn should_notify_desktop(input: &DesktopInput) -> bool {
    if input.status == UserStatus::Busy {
        return false;
    }

    match effective_preference(
        input.preference,
        input.default_preference,
        input.disable_all_message_notifications,
    ) {
        Preference::All => true,
        Preference::Mentions => {
            input.to_all || input.to_here || input.is_highlighted || input.is_mentioned
        }
        Preference::Nothing | Preference::Default => false,
    }
}

/// Decides whether a mobile push is sent to the receiver.
///
/// Presence status is ignored. A preference left to default only reaches
/// receivers without a live connection, unless the operator forces mobile
/// notifications. Explicit `all` and `mentions` preferences apply whatever the
/// connection.
pub fn should_notify_mobile(input: &MobileInput) -> bool {
    let from_default = input.preference == Preference::Default;
    let preference = effective_preference(
        input.preference,
        input.default_preference,
        input.disable_all_message_notifications,
    );

    if from_default && input.has_live_connection && !input.always_notify_mobile {
        return false;
    }

    match preference {
        Preference::All => true,
        Preference::Mentions => input.to_all || input.is_highlighted || input.is_mentioned,
        Preference::Nothing | Preference::Default => false,
    }
}

/// Decides whether an email is sent to the receiver.
///
/// Only receivers without a live connection get emails. Broadcast mentions
/// alone never trigger one.
pub fn should_notify_email(input: &EmailInput) -> bool {
    if input.has_live_connection {
        return false;
    }

    match effective_preference(
        input.preference,
        input.default_preference,
        input.disable_all_message_notifications,
    ) {
        Preference::All => true,
        Preference::Mentions => input.is_highlighted || input.is_mentioned,
        Preference::Nothing | Preference::Default => false,
    }
}
