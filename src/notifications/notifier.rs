//! Evaluation of one subscriber against every channel.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    model::{Channel, Message, Room, Sender, Subscription, User},
    notifications::{
        context::NotificationContext,
        counters::DeliveryCounters,
        eligibility::{
            AudioInput, DesktopInput, EmailInput, MobileInput, should_notify_audio,
            should_notify_desktop, should_notify_email, should_notify_mobile,
        },
        highlight::contains_highlight,
    },
    services::{
        AttentionKind, DeliveryError, EmailNotification, PushNotification, PushPayload, Store,
        Transport,
    },
};

/// The message being fanned out, with everything derived from it.
#[derive(Clone, Copy, Debug)]
pub struct Delivery<'a> {
    pub message: &'a Message,
    pub room: &'a Room,
    pub sender: &'a Sender,
    pub context: &'a NotificationContext,
}

/// Notifies a single subscriber of a message.
///
/// The notifier never fails: skip conditions return silently and transport
/// errors are logged and counted, so one subscriber or channel can never stop
/// the others.
#[derive(Clone)]
pub struct SubscriberNotifier {
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
}

impl SubscriberNotifier {
    pub fn new(store: Arc<dyn Store>, transport: Arc<dyn Transport>) -> Self {
        SubscriberNotifier { store, transport }
    }

    /// Evaluates `subscription` against audio, desktop, push and email, in that
    /// order, and delivers every channel that is eligible.
    ///
    /// When a desktop or push notification fired, the attention hook is called
    /// once for the subscriber.
    pub fn notify(
        &self,
        subscription: &Subscription,
        delivery: &Delivery,
        counters: &DeliveryCounters,
    ) {
        counters.record_subscriber();

        let Some(receiver) = self.resolve_receiver(subscription, delivery) else {
            return;
        };

        let context = delivery.context;
        let mentions = &context.mentions;
        let is_highlighted = contains_highlight(&delivery.message.msg, &receiver.highlights);
        let is_mentioned = mentions.mentions(&subscription.u.id);

        let mut attention = false;

        if should_notify_audio(&AudioInput {
            disable_all_message_notifications: context.disable_all_message_notifications,
            status: receiver.status,
            preference: subscription.audio_notifications,
            default_preference: context.defaults.get(Channel::Audio),
            to_all: mentions.to_all,
            to_here: mentions.to_here,
            is_highlighted,
            is_mentioned,
        }) {
            let result = self.transport.send_audio_cue(
                &subscription.u.id,
                delivery.message,
                delivery.room,
            );
            self.record(counters, Channel::Audio, &subscription.u.id, result);
        }

        if should_notify_desktop(&DesktopInput {
            disable_all_message_notifications: context.disable_all_message_notifications,
            status: receiver.status,
            preference: subscription.desktop_notifications,
            default_preference: context.defaults.get(Channel::Desktop),
            to_all: mentions.to_all,
            to_here: mentions.to_here,
            is_highlighted,
            is_mentioned,
        }) {
            attention = true;
            let result = self.transport.send_desktop_notification(
                &subscription.u.id,
                delivery.sender,
                delivery.message,
                delivery.room,
                subscription.desktop_notification_duration,
            );
            self.record(counters, Channel::Desktop, &subscription.u.id, result);
        }

        if should_notify_mobile(&MobileInput {
            disable_all_message_notifications: context.disable_all_message_notifications,
            preference: subscription.mobile_push_notifications,
            default_preference: context.defaults.get(Channel::Push),
            to_all: mentions.to_all,
            is_highlighted,
            is_mentioned,
            always_notify_mobile: context.always_notify_mobile,
            has_live_connection: receiver.has_live_connection(),
        }) {
            attention = true;
            let push = self.build_push(&receiver, delivery);
            let result = self.transport.send_mobile_push(&push);
            self.record(counters, Channel::Push, &subscription.u.id, result);
        }

        if should_notify_email(&EmailInput {
            disable_all_message_notifications: context.disable_all_message_notifications,
            preference: subscription.email_notifications,
            default_preference: context.defaults.get(Channel::Email),
            is_highlighted,
            is_mentioned,
            has_live_connection: receiver.has_live_connection(),
        }) {
            self.send_email(subscription, &receiver, delivery, counters);
        }

        if attention {
            self.notify_attention(subscription, delivery, counters);
        }
    }

    /// Applies the skip conditions and resolves the receiver of a subscription.
    ///
    /// Returns `None` when the subscriber must not be notified at all.
    fn resolve_receiver(&self, subscription: &Subscription, delivery: &Delivery) -> Option<User> {
        let user_id = &subscription.u.id;

        if *user_id == delivery.sender.id {
            debug!("skip {}: sender of message {}", user_id, delivery.message.id);
            return None;
        }

        if subscription.disable_notifications {
            debug!("skip {}: notifications disabled", user_id);
            return None;
        }

        if subscription.ignores(&delivery.sender.id) {
            debug!("skip {}: ignores {}", user_id, delivery.sender.id);
            return None;
        }

        if subscription.mute_group_mentions && delivery.context.mentions.is_group_mention() {
            debug!("skip {}: group mentions muted", user_id);
            return None;
        }

        match self.store.find_user_by_id(user_id) {
            Some(receiver) if receiver.active => Some(receiver),
            Some(_) => {
                debug!("skip {}: inactive receiver", user_id);
                None
            }
            None => {
                debug!("skip {}: no receiver", user_id);
                None
            }
        }
    }

    fn build_push(&self, receiver: &User, delivery: &Delivery) -> PushNotification {
        let push = &delivery.context.push;

        PushNotification {
            room: delivery.room.clone(),
            room_id: delivery.message.rid.clone(),
            room_name: push.room_label.clone(),
            username: push.username.clone(),
            message: push.body.clone(),
            payload: PushPayload {
                host: delivery.context.site_url.clone(),
                rid: delivery.message.rid.clone(),
                sender: delivery.message.u.clone(),
                room_type: delivery.room.room_type,
                name: delivery.room.name.clone(),
            },
            user_id: receiver.id.clone(),
            receiver_username: receiver.username.clone(),
        }
    }

    /// Sends the email to the first verified address of the receiver, if any.
    fn send_email(
        &self,
        subscription: &Subscription,
        receiver: &User,
        delivery: &Delivery,
        counters: &DeliveryCounters,
    ) {
        let Some(email_address) = receiver.first_verified_email() else {
            debug!("no verified email for {}", receiver.id);
            return;
        };

        let email = EmailNotification {
            message: delivery.message.clone(),
            receiver: receiver.clone(),
            subscription: subscription.clone(),
            room: delivery.room.clone(),
            email_address: email_address.to_owned(),
        };
        let result = self.transport.send_email(&email);
        self.record(counters, Channel::Email, &receiver.id, result);
    }

    fn notify_attention(
        &self,
        subscription: &Subscription,
        delivery: &Delivery,
        counters: &DeliveryCounters,
    ) {
        let summary = format!("@{}: {}", delivery.sender.username, delivery.message.msg);
        let kind = AttentionKind::for_room(delivery.room.room_type);

        counters.record_attention();
        if let Err(e) = self.transport.notify_system_attention(
            delivery.message,
            std::slice::from_ref(&subscription.u.id),
            &summary,
            kind,
        ) {
            warn!("attention hook failed for {}: {}", subscription.u.id, e);
            counters.record_failure();
        }
    }

    fn record(
        &self,
        counters: &DeliveryCounters,
        channel: Channel,
        user_id: &str,
        result: Result<(), DeliveryError>,
    ) {
        counters.record_delivery(channel);
        match result {
            Ok(()) => debug!("{} notification sent to {}", channel, user_id),
            Err(e) => {
                warn!("{} notification to {} failed: {}", channel, user_id, e);
                counters.record_failure();
            }
        }
    }
}
