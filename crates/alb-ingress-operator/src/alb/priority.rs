//! Per-listener rule priority allocation
//!
//! Every rule on a listener needs a unique priority. The allocator hands out
//! `last + 1` under an exclusive lock and only records it as used once the
//! remote create succeeded, so a failed create does not burn a value and
//! concurrent creates on the same listener never see the same priority.

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{Priority, RuleSnapshot};

/// Every priority up to `u32::MAX` has been handed out
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Rule priorities exhausted on listener (last assigned {last})")]
pub struct PrioritiesExhausted {
    pub last: u32,
}

/// Priority counter owned by a listener
#[derive(Debug, Default)]
pub struct PriorityAllocator {
    /// Highest priority known to be in use
    last: Mutex<u32>,
}

impl PriorityAllocator {
    /// Create an allocator whose next priority is `last + 1`
    pub fn new(last: u32) -> Self {
        Self {
            last: Mutex::new(last),
        }
    }

    /// Seed the allocator from the rules observed on the listener.
    ///
    /// The default rule carries no numeric priority and is skipped.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a RuleSnapshot>) -> Self {
        let last = rules
            .into_iter()
            .filter_map(|r| r.priority.and_then(|p| p.value()))
            .max()
            .unwrap_or(0);
        Self::new(last)
    }

    /// Highest priority recorded as used
    pub async fn last(&self) -> u32 {
        *self.last.lock().await
    }

    /// Reserve the next priority.
    ///
    /// The reservation holds the allocator lock until it is committed or
    /// dropped. Dropping without [`PriorityReservation::commit`] leaves the
    /// counter untouched.
    pub async fn reserve(&self) -> Result<PriorityReservation<'_>, PrioritiesExhausted> {
        let guard = self.last.lock().await;
        let next = guard
            .checked_add(1)
            .ok_or(PrioritiesExhausted { last: *guard })?;
        debug!(priority = next, "Reserved rule priority");
        Ok(PriorityReservation { guard, next })
    }
}

/// Exclusive claim on the next priority of a listener
#[derive(Debug)]
pub struct PriorityReservation<'a> {
    guard: MutexGuard<'a, u32>,
    next: u32,
}

impl PriorityReservation<'_> {
    pub fn priority(&self) -> Priority {
        Priority::Value(self.next)
    }

    /// Record the reserved priority as used
    pub fn commit(mut self) {
        *self.guard = self.next;
    }
}
