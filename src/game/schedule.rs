//! Task Scheduler
//!
//! Timers of a session (bot cadence, countdown, delayed advance) are
//! explicit tasks in simulated time. Each task remembers the round it was
//! scheduled for; the engine drops any task whose round is no longer
//! current when it fires. Cancellation is by handle, by round, or all at
//! once when the session ends.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::clock::Millis;

/// What a task does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Run one bot decision (periodic while drawing)
    BotTick,
    /// Count the round timer down by one second (periodic while drawing)
    Countdown,
    /// Leave the results phase (one-shot)
    AdvanceRound,
}

/// Cancellation token of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// A task waiting in the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Cancellation token
    pub handle: TaskHandle,
    /// Task kind
    pub kind: TaskKind,
    /// When the task fires
    pub due: Millis,
    /// Round the task was scheduled for
    pub round: u32,
}

/// Ordered queue of pending tasks.
///
/// Tasks due at the same instant fire in scheduling order.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Keyed by (due, sequence) for deterministic order
    queue: BTreeMap<(Millis, u64), ScheduledTask>,
    /// Next sequence number (monotonic counter)
    next_seq: u64,
    /// No more tasks accepted once closed
    closed: bool,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task. Returns `None` if the scheduler is closed.
    pub fn schedule(&mut self, kind: TaskKind, due: Millis, round: u32) -> Option<TaskHandle> {
        if self.closed {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;

        let handle = TaskHandle(seq);
        self.queue.insert(
            (due, seq),
            ScheduledTask {
                handle,
                kind,
                due,
                round,
            },
        );
        Some(handle)
    }

    /// Cancel one task. Returns `true` if it was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let key = self
            .queue
            .iter()
            .find(|(_, task)| task.handle == handle)
            .map(|(key, _)| *key);
        key.and_then(|k| self.queue.remove(&k)).is_some()
    }

    /// Cancel every pending task matching the predicate.
    /// Returns how many were removed.
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ScheduledTask) -> bool,
    {
        let before = self.queue.len();
        self.queue.retain(|_, task| !predicate(task));
        before - self.queue.len()
    }

    /// Cancel every task scheduled for `round`.
    pub fn cancel_round(&mut self, round: u32) -> usize {
        self.cancel_where(|task| task.round == round)
    }

    /// Cancel every task of a kind.
    #[cfg(test)]
    pub fn cancel_kind(&mut self, kind: TaskKind) -> usize {
        self.cancel_where(|task| task.kind == kind)
    }

    /// Drop all pending tasks.
    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    /// Drop all pending tasks and refuse new ones.
    pub fn close(&mut self) {
        self.closed = true;
        self.queue.clear();
    }

    /// Has [`close`](Self::close) been called?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<ScheduledTask> {
        let key = *self.queue.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.queue.remove(&key)
    }

    /// When the earliest pending task fires.
    pub fn next_due(&self) -> Option<Millis> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Is a task of this kind pending?
    #[cfg(test)]
    pub fn has_pending(&self, kind: TaskKind) -> bool {
        self.queue.values().any(|task| task.kind == kind)
    }

    /// Pending tasks in firing order.
    #[cfg(test)]
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.queue.values()
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// No pending tasks?
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
