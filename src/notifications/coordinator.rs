//! Fan-out of a saved message to the subscribers of its room.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

use crate::{
    model::{Message, Room, RoomType, Sender},
    notifications::{
        context::NotificationContext,
        counters::{DeliveryCounters, FanoutReport},
        join_worker::{JoinQueue, JoinRequest},
        mentions::mentioned_non_members,
        notifier::{Delivery, SubscriberNotifier},
    },
    services::Services,
};

/// Messages older than this are backfills and never notify.
pub const MAX_MESSAGE_AGE_SECS: i64 = 60;

/// Entry point of the pipeline, called once per saved message.
///
/// The coordinator is an observer of the save pipeline: it never changes the
/// message and never fails.
///
/// # Examples
///
/// ```no_run
/// use chime::notifications::{FanoutCoordinator, JoinWorker};
/// # use chime::services::Services;
/// # use chime::model::{Message, Room};
///
/// # async fn example(services: Services, message: Message, room: Room) {
/// let (worker, join_queue) = JoinWorker::new(&services);
/// worker.spawn();
///
/// let coordinator = FanoutCoordinator::new(services, join_queue);
/// let message = coordinator.after_save_message(message, Some(&room), "u1");
/// # }
/// ```
pub struct FanoutCoordinator {
    services: Services,
    notifier: SubscriberNotifier,
    join_queue: JoinQueue,
}

impl FanoutCoordinator {
    pub fn new(services: Services, join_queue: JoinQueue) -> Self {
        let notifier = SubscriberNotifier::new(
            Arc::clone(&services.store),
            Arc::clone(&services.transport),
        );

        FanoutCoordinator {
            services,
            notifier,
            join_queue,
        }
    }

    /// Notifies the room of a newly saved message and hands the message back.
    pub fn after_save_message(
        &self,
        message: Message,
        room: Option<&Room>,
        acting_user_id: &str,
    ) -> Message {
        self.fan_out(&message, room, acting_user_id, Utc::now());
        message
    }

    /// Runs one fan-out as of `now`.
    ///
    /// Returns `None` when the message is not eligible for notifications at
    /// all: edited, stale, posted in an unknown room or by an unknown sender.
    pub fn fan_out(
        &self,
        message: &Message,
        room: Option<&Room>,
        acting_user_id: &str,
        now: DateTime<Utc>,
    ) -> Option<FanoutReport> {
        if message.edited_at.is_some() {
            debug!("skip message {}: edited", message.id);
            return None;
        }

        if let Some(ts) = message.ts
            && (now - ts).abs() > Duration::seconds(MAX_MESSAGE_AGE_SECS)
        {
            debug!("skip message {}: created at {}", message.id, ts);
            return None;
        }

        let Some((room, room_type)) = room.and_then(|r| r.recognized_type().map(|t| (r, t))) else {
            debug!("skip message {}: no room of a known type", message.id);
            return None;
        };

        let Some(sender) = self.resolve_sender(message, room, room_type) else {
            debug!("skip message {}: unknown sender {}", message.id, message.u.id);
            return None;
        };

        let settings = self.services.settings.as_ref();
        let max_members = settings.max_room_members_for_notification();
        let disable_all_message_notifications = max_members != 0 && room.usernames.len() > max_members;
        debug!(
            "room {}: members={}, max_members={}, suppressed={}",
            room.id,
            room.usernames.len(),
            max_members,
            disable_all_message_notifications
        );

        let subscriptions = self
            .services
            .store
            .find_subscriptions_for_room(&room.id, disable_all_message_notifications);

        let context = NotificationContext::build(
            message,
            room,
            room_type,
            &sender,
            acting_user_id,
            disable_all_message_notifications,
            settings,
            self.services.presenter.as_ref(),
        );

        let counters = DeliveryCounters::new();
        let delivery = Delivery {
            message,
            room,
            sender: &sender,
            context: &context,
        };
        for subscription in &subscriptions {
            self.notifier.notify(subscription, &delivery, &counters);
        }

        if room_type == RoomType::Channel {
            self.enqueue_auto_join(message, room, &sender, &context);
        }

        let report = counters.report();
        info!(
            "notified message {} in room {}: {}",
            message.id, room.id, report
        );
        Some(report)
    }

    /// Finds who posted the message: the room visitor for livechat rooms, the
    /// author otherwise.
    fn resolve_sender(&self, message: &Message, room: &Room, room_type: RoomType) -> Option<Sender> {
        if room_type == RoomType::Livechat {
            return room.visitor.clone();
        }

        self.services
            .store
            .find_user_by_id(&message.u.id)
            .map(|user| Sender {
                id: user.id,
                username: user.username,
            })
    }

    fn enqueue_auto_join(
        &self,
        message: &Message,
        room: &Room,
        sender: &Sender,
        context: &NotificationContext,
    ) {
        let users = mentioned_non_members(&message.mentions, room);
        if users.is_empty() {
            return;
        }

        debug!(
            "queue auto-join of {} mentioned users to room {}",
            users.len(),
            room.id
        );
        self.join_queue.enqueue(JoinRequest {
            room: room.clone(),
            message: message.clone(),
            sender: sender.clone(),
            context: context.unsuppressed(),
            users,
        });
    }
}
