//! Chime - notification fan-out for chat messages.
//!
//! This is the entry point of the chime daemon. It loads the configuration and
//! a snapshot of users, rooms and subscriptions, then fans out notifications
//! for every saved message received on standard input.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! notifications:
//!   max_room_members: 500
//!   always_notify_mobile: false
//!
//! gateway:
//!   url: "http://localhost:8080"
//!   site_url: "https://chat.example.com"
//! ```
//!
//! Override any configuration value using environment variables with the `CHIME_` prefix:
//!
//! ```bash
//! export CHIME_GATEWAY__URL="http://gateway:8080"
//! ```
//!
//! # Input
//!
//! One saved message event per line, as JSON:
//!
//! ```json
//! {"message": {"_id": "m1", "rid": "r1", "u": {"_id": "u1", "username": "alice"}, "msg": "hi @bob", "mentions": [{"_id": "u2", "username": "bob"}]}}
//! ```
//!
//! `room` may be given inline; otherwise the room is looked up in the snapshot.
//! `userId` defaults to the message author.
//!
//! # Usage
//!
//! ```bash
//! chime --config config.yaml --data snapshot.json < events.ndjson
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::sync::Arc;

use anyhow::Context;
use chime::{
    config::Config,
    model::{Message, Room},
    notifications::{FanoutCoordinator, JoinWorker},
    services::{GatewayTransport, MemoryStore, Services, Snapshot, TextPresenter},
};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line arguments.
///
/// # Examples
///
/// ```bash
/// chime --config config.yaml --data snapshot.json
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    /// Path to the JSON snapshot of users, rooms and subscriptions.
    #[arg(short, long)]
    data: String,
}

/// A saved message read from standard input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedMessage {
    message: Message,
    #[serde(default)]
    room: Option<Room>,
    #[serde(default)]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting chime {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(&args.config).context("failed to load config file")?;
    let snapshot = Snapshot::load(&args.data).await?;

    let store = Arc::new(MemoryStore::new(snapshot));
    let transport = Arc::new(GatewayTransport::new(&config.gateway.url));
    let services = Services {
        store: store.clone(),
        transport: transport.clone(),
        settings: Arc::new(config),
        presenter: Arc::new(TextPresenter),
        membership: store.clone(),
    };

    let (worker, join_queue) = JoinWorker::new(&services);
    let worker = worker.spawn();
    let coordinator = FanoutCoordinator::new(services, join_queue);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let event: SavedMessage = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping malformed event: {}", e);
                continue;
            }
        };

        let room = event.room.or_else(|| store.find_room(&event.message.rid));
        let user_id = event
            .user_id
            .unwrap_or_else(|| event.message.u.id.clone());
        coordinator.after_save_message(event.message, room.as_ref(), &user_id);
    }

    info!("input closed, waiting for pending auto-joins and deliveries");
    // Dropping the coordinator closes the join queue
    drop(coordinator);
    worker.await.context("join worker panicked")?;
    transport.flush().await;

    Ok(())
}
