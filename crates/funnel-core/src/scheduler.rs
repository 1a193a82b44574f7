//! Virtual-clock scheduler.
//!
//! Every timer in a session registers here instead of owning a thread or a
//! runtime task. The scheduler does not sleep; the caller advances it with
//! `pop_due(now_ms)`, the same way the timer engine is driven by `tick()`.
//!
//! Entries fire in deadline order, ties in registration order. A periodic
//! entry is re-armed at `deadline + period` each time it fires, so a late
//! caller sees every missed period rather than one collapsed firing.

use std::collections::{BTreeMap, HashMap};

/// Opaque handle to a pending registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TimerHandle,
    task: T,
    period_ms: Option<u64>,
}

/// Key ordering the queue: deadline first, then registration sequence.
type Slot = (u64, u64);

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<Slot, Entry<T>>,
    slots: HashMap<TimerHandle, Slot>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `task` once, `delay_ms` from now.
    pub fn once(&mut self, delay_ms: u64, task: T) -> TimerHandle {
        self.insert(self.now_ms.saturating_add(delay_ms), task, None)
    }

    /// Run `task` every `period_ms`, first firing one period from now.
    ///
    /// A zero period is treated as 1ms so the queue always makes progress.
    pub fn every(&mut self, period_ms: u64, task: T) -> TimerHandle {
        let period = period_ms.max(1);
        self.insert(self.now_ms.saturating_add(period), task, Some(period))
    }

    /// Cancel a pending registration. Returns `true` if it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.slots.remove(&handle) {
            Some(slot) => self.queue.remove(&slot).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    /// Deadline of the earliest pending entry.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest entry whose deadline is at or before `now_ms`.
    ///
    /// The clock moves to that entry's deadline, so tasks observe the time
    /// they were scheduled for. Once nothing is due the clock moves to
    /// `now_ms` and `None` is returned.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerHandle, T)> {
        let slot = match self.queue.keys().next() {
            Some(&slot) if slot.0 <= now_ms => slot,
            _ => {
                self.now_ms = self.now_ms.max(now_ms);
                return None;
            }
        };

        let entry = self.queue.remove(&slot)?;
        self.slots.remove(&entry.handle);
        self.now_ms = self.now_ms.max(slot.0);

        if let Some(period) = entry.period_ms {
            let seq = self.bump_seq();
            let next = (slot.0.saturating_add(period), seq);
            self.slots.insert(entry.handle, next);
            self.queue.insert(next, entry.clone());
        }

        Some((entry.handle, entry.task))
    }

    /// Drop every pending registration.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.slots.clear();
    }

    fn insert(&mut self, deadline: u64, task: T, period_ms: Option<u64>) -> TimerHandle {
        let seq = self.bump_seq();
        let handle = TimerHandle(seq);
        let slot = (deadline, seq);
        self.queue.insert(
            slot,
            Entry {
                handle,
                task,
                period_ms,
            },
        );
        self.slots.insert(handle, slot);
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
