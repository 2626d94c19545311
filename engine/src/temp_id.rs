//! Temporary ids for speculative records, and the policy that tells them
//! apart from ids the remote service issued.

use crate::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Allocates ids for speculative records.
///
/// Ids are negative and derived from the wall clock, so they never collide
/// with service-issued ids. Successive ids strictly decrease even when two
/// allocations land in the same millisecond or the clock steps backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempIdAllocator {
    last: UserId,
}

impl TempIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next temporary id for a mutation started at `now`.
    pub fn next(&mut self, now: Timestamp) -> UserId {
        let from_clock = -(now.min(i64::MAX as u64) as i64);
        let id = if from_clock < self.last {
            from_clock
        } else {
            self.last.saturating_sub(1)
        };
        self.last = id;
        id
    }

    /// The most recently allocated id, or 0 if none yet.
    pub fn last(&self) -> UserId {
        self.last
    }
}

/// Where the line between local-only and service-issued ids falls.
///
/// The mock backend only knows a fixed seed range of ids and rejects updates
/// for anything above it. That boundary is configuration, not a contract:
/// `None` means every confirmed id is assumed to be known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdPolicy {
    pub seed_range_max: Option<UserId>,
}

impl IdPolicy {
    pub const fn new(seed_range_max: Option<UserId>) -> Self {
        Self { seed_range_max }
    }

    /// Policy for a service that knows every id it ever issued.
    pub const fn unbounded() -> Self {
        Self::new(None)
    }

    /// True for ids that were allocated locally and never confirmed.
    pub fn is_speculative(&self, id: UserId) -> bool {
        id <= 0
    }

    /// True when the service is expected to accept updates for `id`.
    pub fn service_recognizes(&self, id: UserId) -> bool {
        if self.is_speculative(id) {
            return false;
        }
        self.seed_range_max.map_or(true, |max| id <= max)
    }
}

impl Default for IdPolicy {
    /// The public mock service seeds ids 1..=10.
    fn default() -> Self {
        Self::new(Some(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_negative_and_time_derived() {
        let mut ids = TempIdAllocator::new();
        assert_eq!(ids.next(1_706_745_600_000), -1_706_745_600_000);
    }

    #[test]
    fn same_millisecond_never_collides() {
        let mut ids = TempIdAllocator::new();
        let a = ids.next(5000);
        let b = ids.next(5000);
        let c = ids.next(5000);
        assert_eq!(a, -5000);
        assert_eq!(b, -5001);
        assert_eq!(c, -5002);
    }

    #[test]
    fn clock_going_backwards_still_decreases() {
        let mut ids = TempIdAllocator::new();
        let a = ids.next(9000);
        let b = ids.next(1000);
        assert!(b < a);
        assert_eq!(ids.last(), b);
    }

    #[test]
    fn zero_clock_still_negative() {
        let mut ids = TempIdAllocator::new();
        assert_eq!(ids.next(0), -1);
        assert_eq!(ids.next(0), -2);
    }

    #[test]
    fn policy_boundary() {
        let policy = IdPolicy::default();
        assert!(policy.is_speculative(0));
        assert!(policy.is_speculative(-42));
        assert!(!policy.is_speculative(1));

        assert!(policy.service_recognizes(10));
        assert!(!policy.service_recognizes(11));
        assert!(!policy.service_recognizes(-1));

        let unbounded = IdPolicy::unbounded();
        assert!(unbounded.service_recognizes(10_000));
        assert!(!unbounded.service_recognizes(0));
    }
}
