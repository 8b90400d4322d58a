//! Tick-driven job scheduler.
//!
//! The scheduler does not use internal threads or timers -- the owner calls
//! [`Scheduler::pop_due`] with the current wall-clock time and runs whatever
//! comes back. This mirrors a page's event loop: single-threaded,
//! cooperative, every delayed effect is a scheduled callback.
//!
//! ## Ordering
//!
//! Jobs run in due-time order. Jobs with the same due time run in the order
//! they were scheduled.
//!
//! ## Usage
//!
//! ```
//! use habitdeck_core::scheduler::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! let handle = scheduler.schedule_at(1_000, "reveal");
//! assert!(scheduler.pop_due(999).is_none());
//! assert_eq!(scheduler.pop_due(1_000), Some((handle, "reveal")));
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Cancellable handle to one scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_id: u64,
    queue: BTreeMap<(u64, u64), T>,
    due_by_id: HashMap<u64, u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `job` to run once `now >= due_ms`.
    pub fn schedule_at(&mut self, due_ms: u64, job: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((due_ms, id), job);
        self.due_by_id.insert(id, due_ms);
        TaskHandle(id)
    }

    pub fn schedule_after(&mut self, now_ms: u64, delay_ms: u64, job: T) -> TaskHandle {
        self.schedule_at(now_ms.saturating_add(delay_ms), job)
    }

    /// Cancel a pending job. Returns the job if it had not run yet.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let due = self.due_by_id.remove(&handle.0)?;
        self.queue.remove(&(due, handle.0))
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.due_by_id.contains_key(&handle.0)
    }

    /// Due time of the earliest pending job.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return the earliest job due at `now_ms`, if any.
    ///
    /// Returns one job at a time so a job may schedule or cancel others
    /// (including tearing everything down) before the next one is popped.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TaskHandle, T)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > now_ms {
            return None;
        }
        let job = self.queue.remove(&(due, id))?;
        self.due_by_id.remove(&id);
        Some((TaskHandle(id), job))
    }

    /// Teardown hook: drop every pending job. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.due_by_id.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_then_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule_at(200, "b");
        s.schedule_at(100, "a1");
        s.schedule_at(100, "a2");
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(1_000).map(|(_, j)| j)).collect();
        assert_eq!(order, vec!["a1", "a2", "b"]);
        assert!(s.is_empty());
    }

    #[test]
    fn nothing_runs_early() {
        let mut s = Scheduler::new();
        s.schedule_after(1_000, 800, ());
        assert_eq!(s.next_due(), Some(1_800));
        assert!(s.pop_due(1_799).is_none());
        assert!(s.pop_due(1_800).is_some());
    }

    #[test]
    fn cancel_removes_exactly_once() {
        let mut s = Scheduler::new();
        let h = s.schedule_at(10, 7);
        assert!(s.is_pending(h));
        assert_eq!(s.cancel(h), Some(7));
        assert_eq!(s.cancel(h), None);
        assert!(s.pop_due(100).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Scheduler::new();
        let h = s.schedule_at(10, 'x');
        s.schedule_at(20, 'y');
        assert_eq!(s.clear(), 2);
        assert!(!s.is_pending(h));
        assert_eq!(s.next_due(), None);
    }

    #[test]
    fn saturating_delay() {
        let mut s = Scheduler::new();
        s.schedule_after(u64::MAX - 1, 10, ());
        assert_eq!(s.next_due(), Some(u64::MAX));
    }
}
