//! Chime - notification fan-out for chat messages.
//!
//! When a message is saved in a room, chime decides, for every member of that
//! room, which notifications to raise: an in-app audio cue, a desktop
//! notification, a mobile push and an email. Each decision combines the member's
//! per-room preferences, their presence, mentions and personal highlight words.
//! Members mentioned in a public room they have not joined are added to it in
//! the background, then notified like everyone else.
//!
//! # Architecture
//!
//! - [`model`] - messages, rooms, subscriptions and users
//! - [`notifications`] - the fan-out pipeline
//! - [`services`] - collaborator traits (storage, settings, presentation,
//!   delivery, membership) and their shipped implementations
//! - [`config`] - YAML configuration with environment variable overrides
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chime::config::Config;
//! use chime::notifications::{FanoutCoordinator, JoinWorker};
//! use chime::services::{GatewayTransport, MemoryStore, Services, Snapshot, TextPresenter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load("config.yaml")?;
//! let store = Arc::new(MemoryStore::new(Snapshot::load("snapshot.json").await?));
//!
//! let services = Services {
//!     store: store.clone(),
//!     transport: Arc::new(GatewayTransport::new(&config.gateway.url)),
//!     settings: Arc::new(config),
//!     presenter: Arc::new(TextPresenter),
//!     membership: store,
//! };
//!
//! let (worker, join_queue) = JoinWorker::new(&services);
//! worker.spawn();
//! let coordinator = FanoutCoordinator::new(services, join_queue);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod model;
pub mod notifications;
pub mod services;
