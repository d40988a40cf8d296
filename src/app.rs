use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::question::CHOICE_COUNT;
use crate::quiz::{Quiz, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Terminal front end state: the quiz plus a redraw flag fed by the quiz's
/// change notifications
#[derive(Debug)]
pub struct App {
    pub quiz: Quiz,
    changed: Rc<Cell<bool>>,
}

impl App {
    pub fn new(mut quiz: Quiz) -> Self {
        // first frame always draws
        let changed = Rc::new(Cell::new(true));
        let flag = changed.clone();
        quiz.subscribe(move |_| flag.set(true));

        Self { quiz, changed }
    }

    /// Returns true once per batch of changes since the last call
    pub fn take_changed(&self) -> bool {
        self.changed.replace(false)
    }

    pub fn mark_changed(&self) {
        self.changed.set(true);
    }

    pub fn on_tick(&mut self) {
        self.quiz.poll();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.quiz.restart();
                KeyAction::Continue
            }
            KeyCode::Enter if self.quiz.is_finished() => {
                self.quiz.restart();
                KeyAction::Continue
            }
            KeyCode::Char(c) => {
                if let Some(index) = choice_index(c) {
                    if self.quiz.submit_choice(index) == Submission::Ignored {
                        tracing::debug!(key = %c, "key press had no effect");
                    }
                }
                KeyAction::Continue
            }
            _ => KeyAction::Continue,
        }
    }
}

/// Map the keys '1'..='4' to choice slots
fn choice_index(c: char) -> Option<usize> {
    let digit = c.to_digit(10)? as usize;
    (1..=CHOICE_COUNT).contains(&digit).then(|| digit - 1)
}
