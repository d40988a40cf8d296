use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// What the quiz loop handles next. `Tick` only means "poll the quiz".
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Key releases are dropped; windows reports them alongside presses
fn translate(ev: Event) -> Option<QuizEvent> {
    match ev {
        Event::Key(key) if key.kind != KeyEventKind::Release => Some(QuizEvent::Key(key)),
        Event::Resize(_, _) => Some(QuizEvent::Resize),
        _ => None,
    }
}

/// Merges terminal input with the quiz's own deadlines, so a countdown tick
/// or result advance is never held back by a stream of key presses.
pub struct Runner {
    input: Receiver<QuizEvent>,
    idle: Duration,
}

impl Runner {
    /// Read the terminal on a background thread. `idle` caps how long a step
    /// blocks when the quiz has nothing scheduled.
    pub fn terminal(idle: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            while let Ok(ev) = event::read() {
                if let Some(ev) = translate(ev) {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
            }
        });

        Self::with_input(rx, idle)
    }

    /// Take input from a channel instead of the terminal
    pub fn with_input(input: Receiver<QuizEvent>, idle: Duration) -> Self {
        Self { input, idle }
    }

    /// Input already queued is handed out first. Otherwise wait for input
    /// until `until_due` runs out, then return `Tick`.
    pub fn step(&self, until_due: Option<Duration>) -> QuizEvent {
        match self.input.try_recv() {
            Ok(ev) => return ev,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        let wait = until_due.map_or(self.idle, |due| due.min(self.idle));
        if wait.is_zero() {
            return QuizEvent::Tick;
        }

        match self.input.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => QuizEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => {
                // input is gone for good; keep time moving without spinning
                std::thread::sleep(wait);
                QuizEvent::Tick
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Instant;

    const LONG: Duration = Duration::from_secs(5);

    #[test]
    fn step_ticks_when_nothing_arrives() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::with_input(rx, Duration::from_millis(1));

        assert!(matches!(runner.step(None), QuizEvent::Tick));
    }

    #[test]
    fn step_ticks_at_once_when_overdue() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::with_input(rx, LONG);

        let started = Instant::now();
        assert!(matches!(runner.step(Some(Duration::ZERO)), QuizEvent::Tick));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn step_waits_only_until_the_deadline() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::with_input(rx, LONG);

        let started = Instant::now();
        let ev = runner.step(Some(Duration::from_millis(5)));

        assert!(matches!(ev, QuizEvent::Tick));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn queued_input_comes_before_an_overdue_tick() {
        let (tx, rx) = mpsc::channel();
        tx.send(QuizEvent::Resize).unwrap();
        let runner = Runner::with_input(rx, LONG);

        assert!(matches!(runner.step(Some(Duration::ZERO)), QuizEvent::Resize));
        assert!(matches!(runner.step(Some(Duration::ZERO)), QuizEvent::Tick));
    }

    #[test]
    fn step_ticks_once_sender_is_gone() {
        let (tx, rx) = mpsc::channel::<QuizEvent>();
        drop(tx);
        let runner = Runner::with_input(rx, Duration::from_millis(1));

        assert!(matches!(runner.step(None), QuizEvent::Tick));
    }

    #[test]
    fn translate_keeps_presses_and_resizes() {
        let press = KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE);
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('2'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );

        assert!(matches!(
            translate(Event::Key(press)),
            Some(QuizEvent::Key(k)) if k.code == KeyCode::Char('2')
        ));
        assert!(translate(Event::Key(release)).is_none());
        assert!(matches!(translate(Event::Resize(80, 24)), Some(QuizEvent::Resize)));
        assert!(translate(Event::FocusGained).is_none());
    }
}
