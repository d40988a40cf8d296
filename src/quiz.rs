use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::countdown::{Countdown, CountdownEvent};
use crate::preferences::{BestTime, PreferenceStore};
use crate::question::{Question, QuestionSource};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::session::{Phase, SessionConfig, SessionState};
use crate::util::mean;

/// Deferred work owned by the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizTask {
    CountdownTick,
    Advance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Correct,
    Incorrect,
    /// No question was awaiting an answer
    Ignored,
}

/// Read-only view of the quiz handed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot {
    pub phase: Phase,
    pub question: Question,
    pub choices: Vec<u32>,
    pub score: u32,
    pub question_number: u32,
    pub question_count: u32,
    pub time_remaining: u32,
    pub total_elapsed_secs: f64,
    pub average_secs: Option<f64>,
    pub result_pending: bool,
    pub last_answer_correct: bool,
    pub finished: bool,
    pub best_time_secs: Option<f64>,
    /// Set when the session that just finished recorded a new best time
    pub new_best: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&QuizSnapshot)>;

/// Drives one quiz: questions, countdown, scoring and the best time.
pub struct Quiz {
    config: SessionConfig,
    state: SessionState,
    countdown: Countdown,
    scheduler: Scheduler<QuizTask>,
    pending_advance: Option<TaskHandle>,
    best_time: BestTime,
    new_best: bool,
    questions: Box<dyn QuestionSource>,
    store: Box<dyn PreferenceStore>,
    clock: Box<dyn Clock>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for Quiz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quiz")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("countdown", &self.countdown)
            .field("best_time", &self.best_time)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Quiz {
    /// Load the stored best time and start the first question immediately
    pub fn new(
        config: SessionConfig,
        mut questions: Box<dyn QuestionSource>,
        store: Box<dyn PreferenceStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let best_time = BestTime::load(store.as_ref()).unwrap_or_else(|err| {
            warn!(error = %err, "could not read best time, starting without one");
            BestTime::unset()
        });

        let now = clock.now();
        let state = Self::fresh_state(questions.as_mut(), now);
        let mut quiz = Self {
            countdown: Countdown::new(config.seconds_per_question),
            config,
            state,
            scheduler: Scheduler::new(),
            pending_advance: None,
            best_time,
            new_best: false,
            questions,
            store,
            clock,
            observers: Vec::new(),
            next_subscription: 0,
        };

        quiz.countdown
            .start(&mut quiz.scheduler, now, QuizTask::CountdownTick);
        quiz.log_question();
        quiz
    }

    fn fresh_state(questions: &mut dyn QuestionSource, now: Instant) -> SessionState {
        let question = questions.next_question();
        let choices = questions.choices_for(&question);
        SessionState::new(question, choices, now)
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&QuizSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, observer) in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }

    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            phase: self.state.phase,
            question: self.state.question,
            choices: self.state.choices.clone(),
            score: self.state.score,
            question_number: self.state.question_number,
            question_count: self.config.question_count,
            time_remaining: self.countdown.remaining(),
            total_elapsed_secs: self.state.total_elapsed_secs,
            average_secs: mean(&self.state.durations),
            result_pending: self.state.result_pending(),
            last_answer_correct: self.state.last_answer_correct,
            finished: self.state.is_finished(),
            best_time_secs: self.best_time.seconds(),
            new_best: self.new_best,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn question(&self) -> Question {
        self.state.question
    }

    pub fn choices(&self) -> &[u32] {
        &self.state.choices
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn question_number(&self) -> u32 {
        self.state.question_number
    }

    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn total_elapsed_secs(&self) -> f64 {
        self.state.total_elapsed_secs
    }

    pub fn durations(&self) -> &[f64] {
        &self.state.durations
    }

    pub fn result_pending(&self) -> bool {
        self.state.result_pending()
    }

    pub fn last_answer_correct(&self) -> bool {
        self.state.last_answer_correct
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn best_time(&self) -> BestTime {
        self.best_time
    }

    /// Number of ticks and advances still scheduled
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// How long until the next tick or advance is due. Zero when something is
    /// already overdue, None when nothing is scheduled.
    pub fn time_until_due(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.scheduler
            .next_due()
            .map(|due| due.saturating_duration_since(now))
    }

    /// Answer the current question with `choice`. Values that aren't one of
    /// the displayed choices count as wrong.
    pub fn submit_answer(&mut self, choice: u32) -> Submission {
        let now = self.clock.now();
        let shown = self.state.question_number;
        // anything that came due before the key press happened first
        self.poll_at(now);

        if self.state.phase != Phase::Active {
            warn!(choice, phase = %self.state.phase, "answer ignored");
            return Submission::Ignored;
        }
        // the player was looking at the previous question's result
        if self.state.question_number != shown {
            warn!(choice, question = shown, "answer meant for an earlier question");
            return Submission::Ignored;
        }

        if !self.state.choices.contains(&choice) {
            warn!(choice, choices = ?self.state.choices, "answer is not one of the choices");
        }

        if self.resolve(Some(choice), now) {
            Submission::Correct
        } else {
            Submission::Incorrect
        }
    }

    /// Convenience for the UI: answer with the choice at `index`
    pub fn submit_choice(&mut self, index: usize) -> Submission {
        match self.state.choices.get(index) {
            Some(&choice) => self.submit_answer(choice),
            None => {
                warn!(index, "choice index out of range");
                Submission::Ignored
            }
        }
    }

    /// Throw away the current run and start again from question one.
    /// Pending ticks and advances from the old run are cancelled.
    pub fn restart(&mut self) {
        self.countdown.stop(&mut self.scheduler);
        if let Some(handle) = self.pending_advance.take() {
            self.scheduler.cancel(handle);
        }
        self.scheduler.clear();

        let now = self.clock.now();
        self.state = Self::fresh_state(self.questions.as_mut(), now);
        self.new_best = false;
        self.countdown
            .start(&mut self.scheduler, now, QuizTask::CountdownTick);

        info!(best_time = ?self.best_time.seconds(), "quiz restarted");
        self.log_question();
        self.notify();
    }

    /// Fire everything that is due by now. Returns true if anything happened.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        self.poll_at(now)
    }

    fn poll_at(&mut self, now: Instant) -> bool {
        let mut fired = false;

        while let Some(due) = self.scheduler.pop_due(now) {
            fired = true;
            match due.task {
                QuizTask::CountdownTick => {
                    let event = self.countdown.on_tick(
                        due.handle,
                        due.due,
                        &mut self.scheduler,
                        QuizTask::CountdownTick,
                    );
                    match event {
                        Some(CountdownEvent::Ticked { .. }) => self.notify(),
                        Some(CountdownEvent::Expired) if self.state.phase == Phase::Active => {
                            debug!(
                                question = self.state.question_number,
                                "time ran out"
                            );
                            self.resolve(None, due.due);
                        }
                        Some(CountdownEvent::Expired) | None => {}
                    }
                }
                QuizTask::Advance => {
                    if self.pending_advance == Some(due.handle)
                        && self.state.phase == Phase::ShowingResult
                    {
                        self.pending_advance = None;
                        self.advance(due.due);
                    }
                }
            }
        }

        fired
    }

    /// Score the current question and schedule the move to the next one
    fn resolve(&mut self, selection: Option<u32>, at: Instant) -> bool {
        self.countdown.stop(&mut self.scheduler);

        let spent = at
            .saturating_duration_since(self.state.question_started_at)
            .as_secs_f64();
        self.state.durations.push(spent);
        self.state.total_elapsed_secs += spent;

        let answer = self.state.question.answer();
        let correct = matches!(
            selection,
            Some(choice) if choice == answer && self.state.choices.contains(&choice)
        );
        if correct {
            self.state.score += 1;
        }
        self.state.last_answer_correct = correct;
        self.state.phase = Phase::ShowingResult;

        self.pending_advance = Some(
            self.scheduler
                .schedule_at(at + self.config.result_delay, QuizTask::Advance),
        );

        debug!(
            question = self.state.question_number,
            ?selection,
            answer,
            correct,
            spent_secs = spent,
            score = self.state.score,
            "answer evaluated"
        );
        self.notify();
        correct
    }

    fn advance(&mut self, at: Instant) {
        if self.state.question_number >= self.config.question_count {
            self.finish();
        } else {
            self.state.question_number += 1;
            self.state.question = self.questions.next_question();
            self.state.choices = self.questions.choices_for(&self.state.question);
            self.state.question_started_at = at;
            self.state.phase = Phase::Active;
            self.countdown
                .start(&mut self.scheduler, at, QuizTask::CountdownTick);
            self.log_question();
        }
        self.notify();
    }

    fn finish(&mut self) {
        self.state.phase = Phase::Finished;
        let total = self.state.total_elapsed_secs;

        if self.best_time.is_beaten_by(total) {
            match BestTime::save(self.store.as_mut(), total) {
                Ok(best) => {
                    self.best_time = best;
                    self.new_best = true;
                }
                Err(err) => {
                    warn!(error = %err, total_secs = total, "could not save best time");
                }
            }
        }

        info!(
            score = self.state.score,
            questions = self.config.question_count,
            total_secs = total,
            new_best = self.new_best,
            "quiz finished"
        );
    }

    fn log_question(&self) {
        debug!(
            question = self.state.question_number,
            left = self.state.question.left,
            right = self.state.question.right,
            choices = ?self.state.choices,
            "question presented"
        );
    }
}
