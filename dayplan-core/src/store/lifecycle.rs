//! Request lifecycle bookkeeping shared by the stores.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::api::Operation;
use crate::error::DayplanError;

/// A user-facing error message and when it was raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.raised_at) >= timeout
    }
}

/// Loading/error flags for one store.
///
/// `loading` stays true while any request is in flight, so overlapping
/// operations don't clear each other's spinner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestStatus {
    in_flight: usize,
    error: Option<Notice>,
}

impl RequestStatus {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|n| n.message.as_str())
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.error.as_ref()
    }

    /// Start of a request: loading on, previous error cleared.
    pub(crate) fn begin(&mut self) {
        self.in_flight += 1;
        self.error = None;
    }

    pub(crate) fn finish(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn raise(&mut self, message: String, at: Instant) {
        self.error = Some(Notice {
            message,
            raised_at: at,
        });
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }

    /// Drop the error notice once it has been visible for `timeout`.
    /// Returns true if a notice was removed.
    pub(crate) fn expire_error(&mut self, now: Instant, timeout: Duration) -> bool {
        match &self.error {
            Some(notice) if notice.is_expired(now, timeout) => {
                self.error = None;
                true
            }
            _ => false,
        }
    }
}

/// Banner text for a failed request. Internal errors are replaced by the
/// operation's generic message.
pub(crate) fn notice_for(op: Operation, err: &DayplanError) -> String {
    if err.is_user_facing() {
        err.notice_message()
    } else {
        op.fallback_message().to_string()
    }
}

/// Request sequence number. Higher means issued later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seq(u64);

impl Seq {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Issues sequence numbers and remembers, per resource, the newest response
/// that was applied. A response older than that is stale.
#[derive(Debug, Clone)]
pub struct Sequencer<K> {
    issued: u64,
    applied: HashMap<K, u64>,
}

impl<K> Default for Sequencer<K> {
    fn default() -> Self {
        Sequencer {
            issued: 0,
            applied: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Sequencer<K> {
    pub fn issue(&mut self) -> Seq {
        self.issued += 1;
        Seq(self.issued)
    }

    /// Record `seq` as the latest response for `key` if it is newer than the
    /// last one applied. Returns false for stale responses.
    pub fn accept(&mut self, key: K, seq: Seq) -> bool {
        let last = self.applied.entry(key).or_insert(0);
        if seq.0 > *last {
            *last = seq.0;
            true
        } else {
            false
        }
    }

    pub fn last_applied(&self, key: &K) -> Option<Seq> {
        self.applied.get(key).copied().map(Seq)
    }

    /// Stop tracking `key`, e.g. once the resource no longer exists.
    pub fn forget(&mut self, key: &K) {
        self.applied.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_tracks_overlapping_requests() {
        let mut status = RequestStatus::default();
        status.begin();
        status.begin();
        status.finish();
        assert!(status.loading());
        status.finish();
        assert!(!status.loading());
        status.finish();
        assert_eq!(status.in_flight(), 0);
    }

    #[test]
    fn begin_clears_previous_error() {
        let mut status = RequestStatus::default();
        status.raise("Failed to fetch events".into(), Instant::now());
        assert_eq!(status.error(), Some("Failed to fetch events"));
        status.begin();
        assert_eq!(status.error(), None);
    }

    #[test]
    fn error_expires_after_timeout() {
        let raised = Instant::now();
        let timeout = Duration::from_secs(5);
        let mut status = RequestStatus::default();
        status.raise("boom".into(), raised);

        assert!(!status.expire_error(raised + Duration::from_secs(4), timeout));
        assert_eq!(status.error(), Some("boom"));
        assert!(status.expire_error(raised + Duration::from_secs(5), timeout));
        assert_eq!(status.error(), None);
        assert!(!status.expire_error(raised + Duration::from_secs(6), timeout));
    }

    #[test]
    fn sequencer_rejects_older_responses_per_key() {
        let mut seq: Sequencer<&str> = Sequencer::default();
        let first = seq.issue();
        let second = seq.issue();
        let other = seq.issue();

        assert!(seq.accept("list", second));
        assert!(!seq.accept("list", first));
        assert!(seq.accept("event:1", first));
        assert!(seq.accept("event:2", other));
        assert!(!seq.accept("event:2", other));
        assert_eq!(seq.last_applied(&"list"), Some(second));
        assert_eq!(seq.last_applied(&"missing"), None);
    }

    #[test]
    fn internal_errors_get_generic_notice() {
        let shown = DayplanError::Network("Event is locked".into());
        assert_eq!(notice_for(Operation::DeleteEvent, &shown), "Event is locked");

        let hidden = DayplanError::DataIntegrity("event without identity".into());
        assert_eq!(
            notice_for(Operation::UpdateEvent, &hidden),
            "Failed to update event"
        );
    }

    #[test]
    fn forgotten_keys_are_no_longer_tracked() {
        let mut seq: Sequencer<&str> = Sequencer::default();
        let first = seq.issue();
        seq.accept("event:1", first);
        assert_eq!(seq.last_applied(&"event:1"), Some(first));

        seq.forget(&"event:1");
        assert_eq!(seq.applied.len(), 0);
        assert_eq!(seq.last_applied(&"event:1"), None);
    }
}
