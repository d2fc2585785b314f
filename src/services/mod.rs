//! Collaborators consumed by the notification pipeline.
//!
//! The pipeline owns no storage and no transport. Everything it needs from the
//! outside world goes through the traits of this module:
//!
//! - [`Store`] - user and subscription lookups
//! - [`Settings`] - operator configuration
//! - [`Presenter`] - push body and room label rendering
//! - [`Transport`] - the four delivery channels and the attention hook
//! - [`Membership`] - room auto-join
//!
//! Every trait is mockable through the `Mock*` types generated by `mockall`.
//!
//! Implementations shipped with the crate:
//!
//! - [`MemoryStore`] - in-memory [`Store`] and [`Membership`]
//! - [`GatewayTransport`] - HTTP [`Transport`] posting to a delivery gateway
//! - [`TextPresenter`] - plain text [`Presenter`]

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::model::{Channel, Mention, Message, Preference, Room, RoomType, Sender, Subscription, User};

mod gateway;
mod memory;
mod payloads;
mod presenter;

pub use crate::services::gateway::GatewayTransport;
pub use crate::services::memory::{MemoryStore, Snapshot};
pub use crate::services::payloads::{AttentionKind, EmailNotification, PushNotification, PushPayload};
pub use crate::services::presenter::TextPresenter;

/// Persistence queries.
#[automock]
pub trait Store: Send + Sync {
    /// Looks a user up by id.
    fn find_user_by_id(&self, id: &str) -> Option<User>;
    /// Lists the subscriptions of a room.
    ///
    /// With `only_all_messages`, only subscribers that opted into every message
    /// on at least one channel are returned.
    fn find_subscriptions_for_room(&self, room_id: &str, only_all_messages: bool)
    -> Vec<Subscription>;
    /// Looks up the subscription of `user_id` to `room_id`.
    fn find_subscription(&self, room_id: &str, user_id: &str) -> Option<Subscription>;
}

/// Operator configuration read at the start of every fan-out.
#[automock]
pub trait Settings: Send + Sync {
    /// Member count above which only all-messages subscribers are notified; `0` disables the cap.
    fn max_room_members_for_notification(&self) -> usize;
    /// Push even to users with a live connection.
    fn always_notify_mobile(&self) -> bool;
    /// Include the message text in push bodies.
    fn push_show_message(&self) -> bool;
    /// Include the sender username and room name in pushes.
    fn push_show_username_room(&self) -> bool;
    /// Account-level preference applied when a subscription leaves `channel` to default.
    fn default_preference(&self, channel: Channel) -> Preference;
    /// Public url of the chat server, sent along with pushes.
    fn site_url(&self) -> String;
}

/// Presentation helpers.
#[automock]
pub trait Presenter: Send + Sync {
    /// Renders the text of a push body as seen by `viewer_id`.
    fn render_push_body(&self, message: &Message, viewer_id: &str) -> String;
    /// Renders the display name of a room.
    fn resolve_room_display_name(&self, room_type: RoomType, room: &Room) -> String;
}

/// Delivery channels.
///
/// Calls are fire-and-forget: implementations own queueing and retries and are
/// expected to return quickly. An error only means the delivery could not be
/// handed over.
#[automock]
pub trait Transport: Send + Sync {
    fn send_audio_cue(&self, user_id: &str, message: &Message, room: &Room)
    -> Result<(), DeliveryError>;
    fn send_desktop_notification(
        &self,
        user_id: &str,
        sender: &Sender,
        message: &Message,
        room: &Room,
        duration: Option<u32>,
    ) -> Result<(), DeliveryError>;
    fn send_mobile_push(&self, push: &PushNotification) -> Result<(), DeliveryError>;
    fn send_email(&self, email: &EmailNotification) -> Result<(), DeliveryError>;
    /// Best-effort platform signal raised once per receiver when a desktop or push notification fired.
    fn notify_system_attention(
        &self,
        message: &Message,
        user_ids: &[String],
        summary: &str,
        kind: AttentionKind,
    ) -> Result<(), DeliveryError>;
}

/// Room membership mutation used to auto-join mentioned users.
#[automock]
#[async_trait]
pub trait Membership: Send + Sync {
    /// Adds `user` to the room; the user's subscription exists once this resolves.
    async fn join_room(&self, user: &Mention, room_id: &str) -> Result<(), MembershipError>;
}

/// Shared handles on every collaborator of the pipeline.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub settings: Arc<dyn Settings>,
    pub presenter: Arc<dyn Presenter>,
    pub transport: Arc<dyn Transport>,
    pub membership: Arc<dyn Membership>,
}

/// Errors returned by [`Transport`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to encode {endpoint} payload: {source}")]
    Encode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no runtime available to dispatch {0} delivery")]
    NoRuntime(&'static str),

    #[error("{channel} transport unavailable: {reason}")]
    Unavailable { channel: Channel, reason: String },

    #[error("gateway request failed: {0}")]
    Gateway(#[from] reqwest::Error),
}

/// Errors returned by [`Membership`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("join rejected: {0}")]
    Rejected(String),
}
