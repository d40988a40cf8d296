use std::time::{Duration, Instant};

use crate::config::Config;
use crate::question::Question;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub question_count: u32,
    pub seconds_per_question: u32,
    pub result_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            question_count: cfg.question_count.max(1),
            seconds_per_question: cfg.seconds_per_question.max(1),
            result_delay: Duration::from_millis(cfg.result_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Waiting for an answer
    Active,
    /// Feedback on the last answer is shown until the auto-advance fires
    ShowingResult,
    Finished,
}

/// Everything that belongs to one run of questions. Replaced wholesale on
/// restart.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub question: Question,
    pub choices: Vec<u32>,
    pub score: u32,
    pub question_number: u32,
    pub total_elapsed_secs: f64,
    /// Seconds spent on each resolved question, in order
    pub durations: Vec<f64>,
    pub question_started_at: Instant,
    pub phase: Phase,
    pub last_answer_correct: bool,
}

impl SessionState {
    pub fn new(question: Question, choices: Vec<u32>, started_at: Instant) -> Self {
        Self {
            question,
            choices,
            score: 0,
            question_number: 1,
            total_elapsed_secs: 0.0,
            durations: Vec::new(),
            question_started_at: started_at,
            phase: Phase::Active,
            last_answer_correct: false,
        }
    }

    pub fn result_pending(&self) -> bool {
        self.phase == Phase::ShowingResult
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }
}
