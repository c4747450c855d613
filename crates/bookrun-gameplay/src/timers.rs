//! Delayed-action facility and per-entity timer bookkeeping.
//!
//! This module provides:
//! - [`Scheduler`]: the fire-once / repeating timer capability the game loop
//!   supplies
//! - [`TimerQueue`]: a deterministic, simulated-time implementation of it
//! - [`TimerRegistry`]: the entity-owned record of every outstanding timer,
//!   cancelled in one go on disposal
//!
//! Timers carry a [`TimerEvent`] instead of a closure. When one comes due the
//! driver hands the [`FiredTimer`] back to its owner, which looks it up in its
//! registry; an id the registry no longer tracks is a stale callback and is
//! dropped.

use ahash::AHashMap;
use bookrun_common::{EntityId, TimerId};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Smallest interval a repeating timer may use, in milliseconds.
pub const MIN_REPEAT_INTERVAL_MS: f64 = 1.0;

/// What a timer means to its owner when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Wait is over, start entering
    Entry,
    /// Walk-in finished, start the traversal proper
    EnterTransit,
    /// Attack cadence tick
    Attack,
    /// Pre-phase patrol elapsed, try to stall
    PhaseStall,
    /// Midpoint of a stall, drop the side hazard
    StallHazard,
    /// Stall finished, resume attacking
    Recovery,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Entity that scheduled it
    pub owner: EntityId,
    /// Handle returned at scheduling time
    pub id: TimerId,
    /// Payload
    pub event: TimerEvent,
}

/// Timer capability supplied by the game loop.
pub trait Scheduler {
    /// Fires `event` once for `owner` after `delay_ms`.
    fn schedule_once(&mut self, owner: EntityId, delay_ms: f32, event: TimerEvent) -> TimerId;

    /// Fires `event` for `owner` every `interval_ms` until cancelled.
    fn schedule_repeating(&mut self, owner: EntityId, interval_ms: f32, event: TimerEvent)
        -> TimerId;

    /// Cancels a timer. Returns false if it was unknown or already fired.
    fn cancel(&mut self, id: TimerId) -> bool;
}

#[derive(Debug, Clone)]
struct ScheduledTimer {
    owner: EntityId,
    event: TimerEvent,
    due_ms: f64,
    interval_ms: Option<f64>,
}

/// Simulated-time timer queue.
///
/// Time only moves through [`TimerQueue::advance`]. Due timers are popped one
/// at a time in `(due time, id)` order so that a handler can cancel timers
/// that are due in the same tick before they are popped.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: f64,
    next_id: u64,
    timers: AHashMap<TimerId, ScheduledTimer>,
}

impl TimerQueue {
    /// Creates an empty queue at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Number of live timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timers are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Whether `id` is still scheduled.
    #[must_use]
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Number of live timers owned by `owner`.
    #[must_use]
    pub fn count_for(&self, owner: EntityId) -> usize {
        self.timers.values().filter(|t| t.owner == owner).count()
    }

    /// Live timers owned by `owner`, earliest first.
    #[must_use]
    pub fn pending_for(&self, owner: EntityId) -> Vec<(TimerId, TimerEvent)> {
        let mut pending: Vec<_> = self
            .timers
            .iter()
            .filter(|(_, t)| t.owner == owner)
            .map(|(id, t)| (t.due_ms, *id, t.event))
            .collect();
        pending.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        pending.into_iter().map(|(_, id, event)| (id, event)).collect()
    }

    /// Moves simulated time forward.
    pub fn advance(&mut self, dt_ms: f32) {
        self.now_ms += f64::from(dt_ms.max(0.0));
    }

    /// Pops the earliest timer due at or before the current time.
    ///
    /// Repeating timers are re-armed one interval later and stay in the
    /// queue; a repeating timer that is several intervals behind is popped
    /// once per missed interval.
    pub fn pop_due(&mut self) -> Option<FiredTimer> {
        let id = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= self.now_ms)
            .min_by(|(a_id, a), (b_id, b)| {
                a.due_ms.total_cmp(&b.due_ms).then_with(|| a_id.cmp(b_id))
            })
            .map(|(id, _)| *id)?;

        let fired = match self.timers.get_mut(&id) {
            Some(timer) => {
                let fired = FiredTimer {
                    owner: timer.owner,
                    id,
                    event: timer.event,
                };
                match timer.interval_ms {
                    Some(interval) => timer.due_ms += interval,
                    None => {
                        self.timers.remove(&id);
                    },
                }
                fired
            },
            None => return None,
        };

        trace!("Timer {:?} fired ({:?} for {:?})", id, fired.event, fired.owner);
        Some(fired)
    }

    /// Advances time and drains every timer that comes due.
    ///
    /// Handy when nothing needs to react between pops.
    pub fn advance_and_collect(&mut self, dt_ms: f32) -> Vec<FiredTimer> {
        self.advance(dt_ms);
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due() {
            fired.push(timer);
        }
        fired
    }

    fn insert(
        &mut self,
        owner: EntityId,
        delay_ms: f64,
        event: TimerEvent,
        interval: Option<f64>,
    ) -> TimerId {
        self.next_id += 1;
        let id = TimerId::from_raw(self.next_id);
        self.timers.insert(
            id,
            ScheduledTimer {
                owner,
                event,
                due_ms: self.now_ms + delay_ms,
                interval_ms: interval,
            },
        );
        id
    }
}

impl Scheduler for TimerQueue {
    fn schedule_once(&mut self, owner: EntityId, delay_ms: f32, event: TimerEvent) -> TimerId {
        let id = self.insert(owner, f64::from(delay_ms.max(0.0)), event, None);
        trace!("Scheduled {:?} once in {delay_ms}ms as {:?}", event, id);
        id
    }

    fn schedule_repeating(
        &mut self,
        owner: EntityId,
        interval_ms: f32,
        event: TimerEvent,
    ) -> TimerId {
        let interval = f64::from(interval_ms).max(MIN_REPEAT_INTERVAL_MS);
        let id = self.insert(owner, interval, event, Some(interval));
        trace!("Scheduled {:?} every {interval}ms as {:?}", event, id);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    event: TimerEvent,
    repeating: bool,
}

/// Every timer an entity has outstanding.
///
/// Scheduling goes through the registry so that [`TimerRegistry::dispose`]
/// can cancel all of them. Once disposed the registry refuses new timers and
/// reports every fired id as stale.
#[derive(Debug)]
pub struct TimerRegistry {
    owner: EntityId,
    pending: AHashMap<TimerId, PendingTimer>,
    disposed: bool,
}

impl TimerRegistry {
    /// Creates an empty registry for `owner`.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            pending: AHashMap::new(),
            disposed: false,
        }
    }

    /// Whether [`TimerRegistry::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of tracked timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether a timer with this payload is tracked.
    #[must_use]
    pub fn has_pending(&self, event: TimerEvent) -> bool {
        self.pending.values().any(|p| p.event == event)
    }

    /// Schedules a one-shot timer. Returns `None` once disposed.
    pub fn schedule_once(
        &mut self,
        scheduler: &mut dyn Scheduler,
        delay_ms: f32,
        event: TimerEvent,
    ) -> Option<TimerId> {
        if self.disposed {
            return None;
        }
        let id = scheduler.schedule_once(self.owner, delay_ms, event);
        self.pending.insert(
            id,
            PendingTimer {
                event,
                repeating: false,
            },
        );
        Some(id)
    }

    /// Schedules a repeating timer. Returns `None` once disposed.
    pub fn schedule_repeating(
        &mut self,
        scheduler: &mut dyn Scheduler,
        interval_ms: f32,
        event: TimerEvent,
    ) -> Option<TimerId> {
        if self.disposed {
            return None;
        }
        let id = scheduler.schedule_repeating(self.owner, interval_ms, event);
        self.pending.insert(
            id,
            PendingTimer {
                event,
                repeating: true,
            },
        );
        Some(id)
    }

    /// Cancels every tracked timer carrying `event`.
    pub fn cancel_event(&mut self, scheduler: &mut dyn Scheduler, event: TimerEvent) {
        self.pending.retain(|id, pending| {
            if pending.event == event {
                scheduler.cancel(*id);
                false
            } else {
                true
            }
        });
    }

    /// Resolves a fired timer to its payload.
    ///
    /// Returns `None` for anything stale: disposed registry, cancelled id or
    /// an id this registry never issued. One-shot timers are forgotten here.
    pub fn claim(&mut self, id: TimerId) -> Option<TimerEvent> {
        if self.disposed {
            return None;
        }
        let pending = *self.pending.get(&id)?;
        if !pending.repeating {
            self.pending.remove(&id);
        }
        Some(pending.event)
    }

    /// Marks the registry disposed, then cancels everything it tracks.
    ///
    /// Returns false if it was already disposed.
    pub fn dispose(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        for (id, _) in self.pending.drain() {
            scheduler.cancel(id);
        }
        true
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        if !self.disposed && !self.pending.is_empty() {
            warn!(
                "Timer registry for {:?} dropped with {} timers outstanding",
                self.owner,
                self.pending.len()
            );
        }
    }
}
