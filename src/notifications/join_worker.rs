//! Auto-join of mentioned non-members in public rooms.
//!
//! The coordinator does not wait for joins. It pushes a [`JoinRequest`] on a
//! [`JoinQueue`] and moves on; a [`JoinWorker`] running on its own task joins
//! every user of the request, then notifies them like any other subscriber.
//!
//! ```text
//! FanoutCoordinator ──JoinRequest──▶ JoinQueue ──▶ JoinWorker
//!                                                    │ per request: own task
//!                                                    │ per user: join → find subscription → notify
//! ```

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::{JoinError, JoinHandle, JoinSet},
};

use crate::{
    model::{Mention, Message, Room, Sender},
    notifications::{
        context::NotificationContext,
        counters::{DeliveryCounters, FanoutReport},
        notifier::{Delivery, SubscriberNotifier},
    },
    services::{Membership, Services, Store},
};

/// Mentioned users to add to a room, then notify of `message`.
#[derive(Clone, Debug)]
pub struct JoinRequest {
    pub room: Room,
    pub message: Message,
    pub sender: Sender,
    /// Context of the triggering fan-out, with room suppression lifted
    pub context: NotificationContext,
    pub users: Vec<Mention>,
}

/// Sending half of the auto-join pipeline.
#[derive(Clone)]
pub struct JoinQueue {
    sender: UnboundedSender<JoinRequest>,
}

impl JoinQueue {
    /// Queues a request without waiting.
    ///
    /// Returns `false` when the worker is gone; the request is then dropped.
    pub fn enqueue(&self, request: JoinRequest) -> bool {
        let message_id = request.message.id.clone();
        match self.sender.send(request) {
            Ok(()) => true,
            Err(_) => {
                warn!("join worker stopped, dropping auto-join of message {}", message_id);
                false
            }
        }
    }
}

/// Consumes [`JoinRequest`]s until every [`JoinQueue`] is dropped.
pub struct JoinWorker {
    receiver: UnboundedReceiver<JoinRequest>,
    membership: Arc<dyn Membership>,
    store: Arc<dyn Store>,
    notifier: SubscriberNotifier,
}

impl JoinWorker {
    /// Creates a worker and the queue feeding it.
    pub fn new(services: &Services) -> (Self, JoinQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = JoinWorker {
            receiver,
            membership: Arc::clone(&services.membership),
            store: Arc::clone(&services.store),
            notifier: SubscriberNotifier::new(
                Arc::clone(&services.store),
                Arc::clone(&services.transport),
            ),
        };

        (worker, JoinQueue { sender })
    }

    /// Runs the worker on a background Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Processes requests, each on its own task, until the queue is closed.
    ///
    /// Requests still running when the queue closes are awaited before
    /// returning.
    pub async fn run(mut self) {
        let mut tasks = JoinSet::new();

        while let Some(request) = self.receiver.recv().await {
            // Reap finished requests so the set does not grow unbounded
            while let Some(result) = tasks.try_join_next() {
                log_task_failure(result);
            }

            let membership = Arc::clone(&self.membership);
            let store = Arc::clone(&self.store);
            let notifier = self.notifier.clone();
            tasks.spawn(async move {
                process_request(request, membership, store, notifier).await;
            });
        }

        while let Some(result) = tasks.join_next().await {
            log_task_failure(result);
        }

        debug!("join queue closed, join worker stopped");
    }
}

fn log_task_failure(result: Result<(), JoinError>) {
    if let Err(e) = result {
        warn!("auto-join task failed: {}", e);
    }
}

/// Joins every user of `request` concurrently, notifying each once joined.
async fn process_request(
    request: JoinRequest,
    membership: Arc<dyn Membership>,
    store: Arc<dyn Store>,
    notifier: SubscriberNotifier,
) -> FanoutReport {
    let counters = DeliveryCounters::new();
    let delivery = Delivery {
        message: &request.message,
        room: &request.room,
        sender: &request.sender,
        context: &request.context,
    };

    join_all(request.users.iter().map(|user| {
        join_then_notify(
            user,
            &request.room.id,
            membership.as_ref(),
            store.as_ref(),
            &notifier,
            &delivery,
            &counters,
        )
    }))
    .await;

    let report = counters.report();
    info!(
        "auto-join notifications of message {} in room {}: {}",
        request.message.id, request.room.id, report
    );
    report
}

async fn join_then_notify(
    user: &Mention,
    room_id: &str,
    membership: &dyn Membership,
    store: &dyn Store,
    notifier: &SubscriberNotifier,
    delivery: &Delivery<'_>,
    counters: &DeliveryCounters,
) {
    if let Err(e) = membership.join_room(user, room_id).await {
        warn!("failed to join {} to room {}: {}", user.id, room_id, e);
        return;
    }
    info!("joined mentioned user {} to room {}", user.id, room_id);

    match store.find_subscription(room_id, &user.id) {
        Some(subscription) => notifier.notify(&subscription, delivery, counters),
        None => debug!("no subscription for {} in room {} after join", user.id, room_id),
    }
}
