//! Run-wide counters, shared across batch workers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::outcome::Channel;

/// Atomic counters for one run. Cheap to share behind an `Arc`; every
/// increment uses relaxed ordering since the counters never gate control
/// flow, only reporting.
#[derive(Debug, Default)]
pub struct RunStats {
    total_searches: AtomicU64,
    total_found: AtomicU64,
    without_website: AtomicU64,
    whatsapp_sent: AtomicU64,
    email_sent: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl RunStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total_searches(&self, count: u64) {
        self.total_searches.store(count, Ordering::Relaxed);
    }

    pub fn record_found(&self, count: u64) {
        self.total_found.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_without_website(&self, count: u64) {
        self.without_website.fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_sent(&self, channel: Channel) {
        let counter = match channel {
            Channel::Whatsapp => &self.whatsapp_sent,
            Channel::Email => &self.email_sent,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> RunStatsSnapshot {
        let without_website = self.without_website.load(Ordering::Relaxed);
        let whatsapp_sent = self.whatsapp_sent.load(Ordering::Relaxed);
        let email_sent = self.email_sent.load(Ordering::Relaxed);
        RunStatsSnapshot {
            total_searches: self.total_searches.load(Ordering::Relaxed),
            total_found: self.total_found.load(Ordering::Relaxed),
            without_website,
            whatsapp_sent,
            email_sent,
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            whatsapp_success_rate: rate(whatsapp_sent, without_website),
            email_success_rate: rate(email_sent, without_website),
        }
    }
}

/// Percentage of outreach targets reached on a channel, rounded to one
/// decimal place. Zero targets yields 0.0 rather than a division error.
fn rate(sent: u64, targets: u64) -> f64 {
    if targets == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = sent as f64 / targets as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Point-in-time copy of [`RunStats`], for reports and the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunStatsSnapshot {
    pub total_searches: u64,
    pub total_found: u64,
    pub without_website: u64,
    pub whatsapp_sent: u64,
    pub email_sent: u64,
    pub skipped: u64,
    pub errors: u64,
    pub whatsapp_success_rate: f64,
    pub email_success_rate: f64,
}
