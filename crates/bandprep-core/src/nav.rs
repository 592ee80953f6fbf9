//! Navigation and review state: current position, flags, and the derived
//! per-question display status.

use std::collections::BTreeSet;

use crate::answers::AnswerSheet;
use crate::model::TestCatalog;

/// Visual state of one question button in the navigator, in priority
/// order: the current position wins over a review flag, which wins over
/// an answered mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Current,
    Flagged,
    Answered,
    Unanswered,
}

/// Tracks where the candidate is in the question list and which
/// questions they flagged to revisit before submitting.
#[derive(Debug, Clone)]
pub struct Navigator {
    order: Vec<u32>,
    current_idx: usize,
    flagged: BTreeSet<u32>,
}

impl Navigator {
    pub fn new(catalog: &TestCatalog) -> Self {
        Self {
            order: catalog.question_order(),
            current_idx: 0,
            flagged: BTreeSet::new(),
        }
    }

    /// The id of the current question. Panics only on an empty catalog,
    /// which the parser rejects.
    pub fn current(&self) -> u32 {
        self.order[self.current_idx]
    }

    /// Jump to a question by id. Unknown ids are ignored.
    pub fn go_to(&mut self, question_id: u32) {
        if let Some(idx) = self.order.iter().position(|&id| id == question_id) {
            self.current_idx = idx;
        } else {
            tracing::debug!("go_to ignored unknown question {question_id}");
        }
    }

    /// Advance to the next question in catalog order, clamped at the last.
    pub fn next(&mut self) {
        if self.current_idx + 1 < self.order.len() {
            self.current_idx += 1;
        }
    }

    /// Step back to the previous question, clamped at the first.
    pub fn prev(&mut self) {
        self.current_idx = self.current_idx.saturating_sub(1);
    }

    /// Flip the review flag for a question; returns the new state.
    pub fn toggle_review(&mut self, question_id: u32) -> bool {
        if self.flagged.remove(&question_id) {
            false
        } else {
            self.flagged.insert(question_id);
            true
        }
    }

    pub fn is_flagged(&self, question_id: u32) -> bool {
        self.flagged.contains(&question_id)
    }

    pub fn flagged(&self) -> impl Iterator<Item = u32> + '_ {
        self.flagged.iter().copied()
    }

    /// Derive the navigator display state for one question.
    pub fn status(&self, question_id: u32, answers: &AnswerSheet) -> QuestionStatus {
        if question_id == self.current() {
            QuestionStatus::Current
        } else if self.is_flagged(question_id) {
            QuestionStatus::Flagged
        } else if answers.is_answered(question_id) {
            QuestionStatus::Answered
        } else {
            QuestionStatus::Unanswered
        }
    }
}
