use std::time::{Duration, Instant};

use crate::scheduler::{Scheduler, TaskHandle};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Ticked { remaining: u32 },
    Expired,
}

/// Per-question countdown. At most one tick is ever pending.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration_secs: u32,
    remaining: u32,
    handle: Option<TaskHandle>,
}

impl Countdown {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            remaining: duration_secs,
            handle: None,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Reset to the full duration and schedule the first tick. Any tick
    /// still pending from an earlier start is cancelled first.
    pub fn start<T>(&mut self, scheduler: &mut Scheduler<T>, now: Instant, tick: T) {
        self.stop(scheduler);
        self.remaining = self.duration_secs;
        self.handle = Some(scheduler.schedule_at(now + TICK_INTERVAL, tick));
    }

    pub fn stop<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }

    /// Handle a fired tick. Ticks that don't belong to the current run are
    /// ignored and return None.
    pub fn on_tick<T>(
        &mut self,
        handle: TaskHandle,
        due: Instant,
        scheduler: &mut Scheduler<T>,
        tick: T,
    ) -> Option<CountdownEvent> {
        if self.handle != Some(handle) {
            return None;
        }
        self.handle = None;
        self.remaining = self.remaining.saturating_sub(1);

        if self.remaining == 0 {
            return Some(CountdownEvent::Expired);
        }

        // next tick is anchored to this tick's due time so late polls don't drift
        self.handle = Some(scheduler.schedule_at(due + TICK_INTERVAL, tick));
        Some(CountdownEvent::Ticked {
            remaining: self.remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire(
        countdown: &mut Countdown,
        scheduler: &mut Scheduler<()>,
        now: Instant,
    ) -> Vec<CountdownEvent> {
        let mut events = Vec::new();
        while let Some(due) = scheduler.pop_due(now) {
            if let Some(event) = countdown.on_tick(due.handle, due.due, scheduler, ()) {
                events.push(event);
            }
        }
        events
    }

    #[test]
    fn test_start_resets_and_schedules() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut countdown = Countdown::new(30);

        countdown.start(&mut scheduler, base, ());

        assert_eq!(countdown.remaining(), 30);
        assert!(countdown.handle.is_some());
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(base + TICK_INTERVAL));
    }

    #[test]
    fn test_ticks_decrement_once_per_second() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut countdown = Countdown::new(30);
        countdown.start(&mut scheduler, base, ());

        let events = fire(&mut countdown, &mut scheduler, base + Duration::from_secs(3));

        assert_eq!(
            events,
            vec![
                CountdownEvent::Ticked { remaining: 29 },
                CountdownEvent::Ticked { remaining: 28 },
                CountdownEvent::Ticked { remaining: 27 },
            ]
        );
        assert_eq!(countdown.remaining(), 27);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_expires_at_zero_and_stops() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut countdown = Countdown::new(3);
        countdown.start(&mut scheduler, base, ());

        let events = fire(&mut countdown, &mut scheduler, base + Duration::from_secs(10));

        assert_eq!(events.last(), Some(&CountdownEvent::Expired));
        assert_eq!(events.len(), 3);
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.handle.is_none());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_restart_cancels_previous_tick_stream() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut countdown = Countdown::new(30);
        countdown.start(&mut scheduler, base, ());
        countdown.start(&mut scheduler, base + Duration::from_millis(500), ());

        assert_eq!(scheduler.len(), 1);

        // only the second stream's tick fires
        let events = fire(&mut countdown, &mut scheduler, base + Duration::from_millis(1600));
        assert_eq!(events, vec![CountdownEvent::Ticked { remaining: 29 }]);
    }

    #[test]
    fn test_stale_tick_is_ignored() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut countdown = Countdown::new(30);
        countdown.start(&mut scheduler, base, ());
        let stale = scheduler.pop_due(base + TICK_INTERVAL).unwrap();

        countdown.start(&mut scheduler, base + TICK_INTERVAL, ());

        assert_eq!(
            countdown.on_tick(stale.handle, stale.due, &mut scheduler, ()),
            None
        );
        assert_eq!(countdown.remaining(), 30);
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let base = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut countdown = Countdown::new(30);
        countdown.start(&mut scheduler, base, ());

        countdown.stop(&mut scheduler);

        assert!(countdown.handle.is_none());
        assert!(scheduler.is_empty());
    }
}
