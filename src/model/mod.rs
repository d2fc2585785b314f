//! Records read by the notification pipeline.
//!
//! - [`Message`] - the saved message that triggers a fan-out
//! - [`Room`] - the room the message was posted in
//! - [`Subscription`] - per-room notification preferences of a member
//! - [`User`] - the receiver resolved from a subscription
//!
//! All of them are owned by the persistence layer and are never mutated here.

mod message;
mod room;
mod subscription;
mod user;

pub use crate::model::message::{Mention, Message, Sender};
pub use crate::model::room::{Room, RoomType};
pub use crate::model::subscription::{Channel, Preference, Subscription, SubscriptionUser};
pub use crate::model::user::{ConnectionStatus, Email, User, UserStatus};

/// Errors raised when building records.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A subscription must reference a user
    #[error("subscription in room {0} has no user id")]
    MissingUser(String),
}
