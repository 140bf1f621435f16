//! Repeating per-entity timers on a single virtual clock.
//!
//! Every live timer has one current entry in a min-heap keyed on
//! `(due_ms, seq)`. Cancelling or re-arming a timer leaves the old heap
//! entry behind; stale entries are recognised by their sequence number and
//! skipped when they reach the top.

use chroma_core::{EntityId, TimerKind};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    pub owner: EntityId,
    pub kind: TimerKind,
    pub interval_ms: u64,
    pub due_ms: u64,
    seq: u64,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub timer: TimerId,
    pub owner: EntityId,
    pub kind: TimerKind,
    pub due_ms: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<(u64, u64, TimerId)>>,
    timers: HashMap<TimerId, Timer>,
    by_owner: HashMap<EntityId, TimerId>,
    next_id: u64,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a repeating timer first due at `now_ms + interval_ms`.
    ///
    /// An entity owns at most one timer; any previous one is cancelled.
    pub fn schedule(
        &mut self,
        owner: EntityId,
        kind: TimerKind,
        now_ms: u64,
        interval_ms: u64,
    ) -> TimerId {
        self.cancel_owner(owner);

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let interval_ms = interval_ms.max(1);
        let timer = Timer {
            id,
            owner,
            kind,
            interval_ms,
            due_ms: now_ms.saturating_add(interval_ms),
            seq: 0,
        };
        self.timers.insert(id, timer);
        self.by_owner.insert(owner, id);
        self.push(id);
        id
    }

    /// Restart `id` with a new interval, counting from `now_ms`
    pub fn reschedule(&mut self, id: TimerId, now_ms: u64, interval_ms: u64) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) => {
                timer.interval_ms = interval_ms.max(1);
                timer.due_ms = now_ms.saturating_add(timer.interval_ms);
                self.push(id);
                true
            }
            None => false,
        }
    }

    fn push(&mut self, id: TimerId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(timer) = self.timers.get_mut(&id) {
            timer.seq = seq;
            self.queue.push(Reverse((timer.due_ms, seq, id)));
        }
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some(timer) => {
                self.by_owner.remove(&timer.owner);
                true
            }
            None => false,
        }
    }

    pub fn cancel_owner(&mut self, owner: EntityId) -> bool {
        match self.by_owner.get(&owner).copied() {
            Some(id) => self.cancel(id),
            None => false,
        }
    }

    pub fn timer_for(&self, owner: EntityId) -> Option<&Timer> {
        self.by_owner.get(&owner).and_then(|id| self.timers.get(id))
    }

    /// Due time of the earliest live timer
    pub fn next_due(&mut self) -> Option<u64> {
        self.discard_stale();
        self.queue.peek().map(|Reverse((due, _, _))| *due)
    }

    /// Pop the earliest live timer if it is due at or before `now_ms`,
    /// re-arming it one interval after its due time.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired> {
        let due = self.next_due()?;
        if due > now_ms {
            return None;
        }

        let Reverse((due_ms, _, id)) = self.queue.pop()?;
        let timer = self.timers.get_mut(&id)?;
        let fired = Fired {
            timer: id,
            owner: timer.owner,
            kind: timer.kind,
            due_ms,
        };
        timer.due_ms = due_ms.saturating_add(timer.interval_ms);
        self.push(id);
        Some(fired)
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, seq, id))) = self.queue.peek() {
            let live = self.timers.get(id).is_some_and(|t| t.seq == *seq);
            if live {
                break;
            }
            self.queue.pop();
        }
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        self.by_owner.clear();
        self.queue.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        let slow = EntityId::new();
        let fast = EntityId::new();
        scheduler.schedule(slow, TimerKind::Production, 0, 300);
        scheduler.schedule(fast, TimerKind::Movement, 0, 100);

        assert_eq!(scheduler.next_due(), Some(100));
        assert!(scheduler.pop_due(99).is_none());

        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(300))
            .map(|f| (f.owner, f.due_ms))
            .collect();
        assert_eq!(
            order,
            vec![(fast, 100), (fast, 200), (slow, 300), (fast, 300)]
        );
    }

    #[test]
    fn test_ties_fire_in_arming_order() {
        let mut scheduler = Scheduler::new();
        let a = EntityId::new();
        let b = EntityId::new();
        scheduler.schedule(a, TimerKind::Production, 0, 50);
        scheduler.schedule(b, TimerKind::Production, 0, 50);

        assert_eq!(scheduler.pop_due(50).unwrap().owner, a);
        assert_eq!(scheduler.pop_due(50).unwrap().owner, b);
    }

    #[test]
    fn test_cancel_stops_firing() {
        let mut scheduler = Scheduler::new();
        let owner = EntityId::new();
        let id = scheduler.schedule(owner, TimerKind::Movement, 0, 10);

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.is_empty());
        assert!(scheduler.pop_due(1_000).is_none());
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn test_one_timer_per_owner() {
        let mut scheduler = Scheduler::new();
        let owner = EntityId::new();
        scheduler.schedule(owner, TimerKind::Production, 0, 10);
        scheduler.schedule(owner, TimerKind::Production, 0, 40);

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(40));
        assert!(scheduler.cancel_owner(owner));
        assert!(scheduler.timer_for(owner).is_none());
    }

    #[test]
    fn test_reschedule_drops_old_due_time() {
        let mut scheduler = Scheduler::new();
        let owner = EntityId::new();
        let id = scheduler.schedule(owner, TimerKind::Production, 0, 10);

        assert!(scheduler.reschedule(id, 5, 100));
        assert_eq!(scheduler.next_due(), Some(105));
        assert_eq!(scheduler.timer_for(owner).unwrap().interval_ms, 100);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(EntityId::new(), TimerKind::Movement, 7, 0);
        assert_eq!(scheduler.next_due(), Some(8));
    }
}
