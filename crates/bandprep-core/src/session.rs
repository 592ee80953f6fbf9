//! The exam-session state machine.
//!
//! A [`TestSession`] owns the answer sheet, drag board, and navigator for
//! one run through a catalog, and enforces the one-directional lifecycle
//! tutorial → in-progress → submitted. All mutation goes through its
//! methods; there is no ambient session state anywhere else.

use crate::answers::AnswerSheet;
use crate::dragboard::DragBoard;
use crate::model::{QuestionKind, TestCatalog};
use crate::nav::{Navigator, QuestionStatus};
use crate::scoring::{score, ScoreResult};

/// Lifecycle stage of a session. Transitions only move rightward; the
/// submitted state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tutorial,
    InProgress,
    Submitted,
}

pub struct TestSession {
    catalog: TestCatalog,
    answers: AnswerSheet,
    board: DragBoard,
    nav: Navigator,
    phase: Phase,
    time_remaining: u32,
    result: Option<ScoreResult>,
}

impl TestSession {
    /// A fresh session in the tutorial phase with an empty answer sheet.
    pub fn new(catalog: TestCatalog) -> Self {
        let nav = Navigator::new(&catalog);
        let time_remaining = catalog.duration_secs;
        Self {
            catalog,
            answers: AnswerSheet::new(),
            board: DragBoard::new(),
            nav,
            phase: Phase::Tutorial,
            time_remaining,
            result: None,
        }
    }

    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Seconds spent in the in-progress phase so far.
    pub fn time_used(&self) -> u32 {
        self.catalog.duration_secs - self.time_remaining
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn board(&self) -> &DragBoard {
        &self.board
    }

    /// The computed score, present once submitted.
    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    /// Dismiss the tutorial and start the test. The caller arms the
    /// countdown at the same moment; a session that never begins never
    /// submits.
    pub fn begin(&mut self) {
        match self.phase {
            Phase::Tutorial => {
                self.phase = Phase::InProgress;
                tracing::info!(catalog = %self.catalog.id, "test started");
            }
            _ => tracing::debug!("begin ignored in phase {:?}", self.phase),
        }
    }

    /// One elapsed second. At zero the session submits itself, exactly as
    /// if the candidate had pressed submit.
    pub fn tick(&mut self) -> Phase {
        if self.phase == Phase::InProgress && self.time_remaining > 0 {
            self.time_remaining -= 1;
            if self.time_remaining == 0 {
                tracing::info!(catalog = %self.catalog.id, "time expired, submitting");
                self.finalize();
            }
        }
        self.phase
    }

    /// Record a typed answer. Only valid while in progress: the sheet is
    /// frozen on submission and untouched during the tutorial.
    pub fn set_answer(&mut self, question_id: u32, value: impl Into<String>) {
        if self.phase != Phase::InProgress {
            tracing::debug!("answer ignored in phase {:?}", self.phase);
            return;
        }
        self.answers.set(question_id, value);
    }

    /// Drop a token onto a drag-type question slot. Rejects non-drag
    /// slots; the board enforces the one-to-one token↔slot invariant.
    pub fn assign_token(&mut self, token_id: &str, question_id: u32) -> bool {
        if self.phase != Phase::InProgress {
            tracing::debug!("drop ignored in phase {:?}", self.phase);
            return false;
        }
        match self.catalog.question(question_id).map(|q| &q.kind) {
            Some(QuestionKind::Drag) => {
                self.board
                    .assign(&self.catalog, &mut self.answers, token_id, question_id)
            }
            Some(other) => {
                tracing::warn!(
                    "question {question_id} is {}, not a drop target",
                    other.label()
                );
                false
            }
            None => {
                tracing::warn!("drop on unknown question {question_id}");
                false
            }
        }
    }

    /// Take a token back out of its slot.
    pub fn unassign_token(&mut self, token_id: &str) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }
        self.board.unassign(&mut self.answers, token_id)
    }

    pub fn current_question(&self) -> u32 {
        self.nav.current()
    }

    pub fn go_to(&mut self, question_id: u32) {
        self.nav.go_to(question_id);
    }

    pub fn next_question(&mut self) {
        self.nav.next();
    }

    pub fn prev_question(&mut self) {
        self.nav.prev();
    }

    pub fn toggle_review(&mut self, question_id: u32) -> bool {
        self.nav.toggle_review(question_id)
    }

    pub fn flagged(&self) -> Vec<u32> {
        self.nav.flagged().collect()
    }

    pub fn is_complete(&self, question_id: u32) -> bool {
        self.answers.is_answered(question_id)
    }

    pub fn status(&self, question_id: u32) -> QuestionStatus {
        self.nav.status(question_id, &self.answers)
    }

    /// Explicit submission. Idempotent once submitted; ignored during the
    /// tutorial. Returns the score when the session has one.
    pub fn submit(&mut self) -> Option<&ScoreResult> {
        match self.phase {
            Phase::InProgress => {
                tracing::info!(catalog = %self.catalog.id, "submitted");
                self.finalize();
            }
            Phase::Submitted => {}
            Phase::Tutorial => tracing::debug!("submit ignored during tutorial"),
        }
        self.result.as_ref()
    }

    /// The single convergence point for manual submit and timer expiry:
    /// freeze the sheet, flip the phase, compute the score.
    fn finalize(&mut self) {
        self.phase = Phase::Submitted;
        self.result = Some(score(&self.catalog, &self.answers));
    }
}
