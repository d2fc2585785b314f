//! Delivery bookkeeping of one fan-out.

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::model::Channel;

/// Tallies of one fan-out invocation.
///
/// Increments are atomic so subscribers may be evaluated concurrently. A fresh
/// instance is created for every fan-out and turned into a [`FanoutReport`]
/// once it is done.
#[derive(Debug, Default)]
pub struct DeliveryCounters {
    subscribers: AtomicUsize,
    audio: AtomicUsize,
    desktop: AtomicUsize,
    push: AtomicUsize,
    email: AtomicUsize,
    attention: AtomicUsize,
    failures: AtomicUsize,
}

impl DeliveryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a subscriber handed to the notifier, skipped or not.
    pub fn record_subscriber(&self) {
        self.subscribers.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a delivery attempted on `channel`.
    pub fn record_delivery(&self, channel: Channel) {
        let counter = match channel {
            Channel::Audio => &self.audio,
            Channel::Desktop => &self.desktop,
            Channel::Push => &self.push,
            Channel::Email => &self.email,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a call to the attention hook.
    pub fn record_attention(&self) {
        self.attention.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a transport call that returned an error.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of the counters.
    pub fn report(&self) -> FanoutReport {
        FanoutReport {
            subscribers: self.subscribers.load(Ordering::Relaxed),
            audio: self.audio.load(Ordering::Relaxed),
            desktop: self.desktop.load(Ordering::Relaxed),
            push: self.push.load(Ordering::Relaxed),
            email: self.email.load(Ordering::Relaxed),
            attention: self.attention.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of one fan-out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub subscribers: usize,
    pub audio: usize,
    pub desktop: usize,
    pub push: usize,
    pub email: usize,
    pub attention: usize,
    pub failures: usize,
}

impl fmt::Display for FanoutReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "subscribers={}, audio={}, desktop={}, push={}, email={}, attention={}, failures={}",
            self.subscribers,
            self.audio,
            self.desktop,
            self.push,
            self.email,
            self.attention,
            self.failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        assert_eq!(DeliveryCounters::new().report(), FanoutReport::default());
    }

    #[test]
    fn test_record_per_channel() {
        let counters = DeliveryCounters::new();
        counters.record_subscriber();
        counters.record_subscriber();
        counters.record_delivery(Channel::Desktop);
        counters.record_delivery(Channel::Push);
        counters.record_delivery(Channel::Push);
        counters.record_attention();
        counters.record_failure();

        let report = counters.report();
        assert_eq!(report.subscribers, 2);
        assert_eq!(report.audio, 0);
        assert_eq!(report.desktop, 1);
        assert_eq!(report.push, 2);
        assert_eq!(report.email, 0);
        assert_eq!(report.attention, 1);
        assert_eq!(report.failures, 1);
    }

    #[test]
    fn test_report_display() {
        let report = FanoutReport {
            subscribers: 3,
            desktop: 1,
            ..FanoutReport::default()
        };
        let display = format!("{}", report);
        assert!(display.contains("subscribers=3"));
        assert!(display.contains("desktop=1"));
        assert!(display.contains("email=0"));
    }
}
