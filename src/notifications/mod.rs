//! Notification fan-out of saved messages.
//!
//! # Pipeline
//!
//! ```text
//! message saved
//!      │
//!      ▼
//! ┌───────────────────┐   edited, stale, unknown room or sender → return
//! │ FanoutCoordinator │
//! └───────────────────┘
//!      │ NotificationContext (mentions, suppression, push texts)
//!      ▼
//! ┌────────────────────┐  once per subscription
//! │ SubscriberNotifier │ ─── audio → desktop → push → email → attention hook
//! └────────────────────┘
//!      │ public rooms only
//!      ▼
//! ┌────────────┐  detached
//! │ JoinWorker │ ─── join mentioned non-members, then notify them
//! └────────────┘
//! ```
//!
//! # Modules
//!
//! - `mentions` - mention ids and broadcast flags
//! - `highlight` - personal keyword matching
//! - `eligibility` - one rule per channel
//! - `context` - data shared by every subscriber of a fan-out
//! - `counters` - delivery bookkeeping of a fan-out
//! - `notifier` - evaluation of one subscriber
//! - `coordinator` - fan-out entry point
//! - `join_worker` - auto-join of mentioned non-members

mod context;
mod coordinator;
mod counters;
mod eligibility;
mod highlight;
mod join_worker;
mod mentions;
mod notifier;

pub use crate::notifications::context::{
    DefaultPreferences, HIDDEN_PUSH_BODY, NotificationContext, PushContent,
};
pub use crate::notifications::coordinator::{FanoutCoordinator, MAX_MESSAGE_AGE_SECS};
pub use crate::notifications::counters::{DeliveryCounters, FanoutReport};
pub use crate::notifications::eligibility::{
    AudioInput, DesktopInput, EmailInput, MobileInput, should_notify_audio, should_notify_desktop,
    should_notify_email, should_notify_mobile,
};
pub use crate::notifications::highlight::contains_highlight;
pub use crate::notifications::join_worker::{JoinQueue, JoinRequest, JoinWorker};
pub use crate::notifications::mentions::{
    ALL, HERE, MentionSet, mentioned_non_members, resolve_mentions,
};
pub use crate::notifications::notifier::{Delivery, SubscriberNotifier};
