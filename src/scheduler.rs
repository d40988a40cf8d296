use std::time::Instant;

/// Handle to a scheduled task. Handles are never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TaskHandle,
    due: Instant,
    task: T,
}

/// A task that became due, along with the instant it was scheduled for
#[derive(Debug, Clone, PartialEq)]
pub struct DueTask<T> {
    pub handle: TaskHandle,
    pub due: Instant,
    pub task: T,
}

/// Single-threaded deferred task queue.
///
/// Nothing runs on its own: the owner polls with the current time and
/// handles whatever came due. Tasks due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule_at(&mut self, due: Instant, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled { handle, due, task });
        handle
    }

    /// Returns true if the task was still pending
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.handle != handle);
        self.pending.len() != before
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|s| s.due).min()
    }

    /// Remove and return the earliest task due at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<DueTask<T>> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= now)
            .min_by_key(|(_, s)| (s.due, s.handle.0))
            .map(|(idx, _)| idx)?;

        let Scheduled { handle, due, task } = self.pending.remove(idx);
        Some(DueTask { handle, due, task })
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_respects_time() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(base + Duration::from_secs(1), "tick");

        assert!(scheduler.pop_due(base).is_none());
        let due = scheduler.pop_due(base + Duration::from_secs(1)).unwrap();
        assert_eq!(due.task, "tick");
        assert_eq!(due.due, base + Duration::from_secs(1));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_pop_due_orders_by_due_then_insertion() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(base + Duration::from_secs(2), "late");
        scheduler.schedule_at(base + Duration::from_secs(1), "first");
        scheduler.schedule_at(base + Duration::from_secs(1), "second");

        let now = base + Duration::from_secs(5);
        let order: Vec<&str> = std::iter::from_fn(|| scheduler.pop_due(now))
            .map(|d| d.task)
            .collect();

        assert_eq!(order, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_cancel_removes_task() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule_at(base, 1);
        let dropped = scheduler.schedule_at(base, 2);

        assert!(scheduler.cancel(dropped));
        assert!(!scheduler.cancel(dropped));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.pending.iter().all(|s| s.handle == keep));

        assert_eq!(scheduler.pop_due(base).map(|d| d.task), Some(1));
        assert!(scheduler.pop_due(base).is_none());
    }

    #[test]
    fn test_handles_are_unique_after_clear() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let a = scheduler.schedule_at(base, ());
        scheduler.clear();
        let b = scheduler.schedule_at(base, ());

        assert_ne!(a, b);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(base));
    }
}
