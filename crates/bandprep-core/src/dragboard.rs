//! Drag-assignment board: a bidirectional one-to-one map between drag
//! tokens and question slots.
//!
//! Keeping both directions in lockstep means a token reassigned to a new
//! slot vacates its old slot, and a slot receiving a new token releases
//! the one it held. A lone `is_used` flag on the token cannot express
//! this and leaves orphaned "used" tokens with no visible slot.

use std::collections::HashMap;

use crate::answers::AnswerSheet;
use crate::model::TestCatalog;

#[derive(Debug, Clone, Default)]
pub struct DragBoard {
    token_to_slot: HashMap<String, u32>,
    slot_to_token: HashMap<u32, String>,
}

impl DragBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `token_id` into `question_id`'s slot and write the token
    /// value into the answer sheet. Vacates the token's previous slot and
    /// releases the slot's previous token first. Returns `false` (and
    /// changes nothing) when the token is not in the catalog's pool.
    pub fn assign(
        &mut self,
        catalog: &TestCatalog,
        answers: &mut AnswerSheet,
        token_id: &str,
        question_id: u32,
    ) -> bool {
        let Some(token) = catalog.token(token_id) else {
            tracing::warn!("ignoring drop of unknown token '{token_id}'");
            return false;
        };

        // Vacate the slot this token previously occupied.
        if let Some(old_slot) = self.token_to_slot.remove(token_id) {
            self.slot_to_token.remove(&old_slot);
            answers.clear(old_slot);
        }

        // Release whatever token the target slot held.
        if let Some(old_token) = self.slot_to_token.remove(&question_id) {
            self.token_to_slot.remove(&old_token);
        }

        self.token_to_slot.insert(token_id.to_owned(), question_id);
        self.slot_to_token.insert(question_id, token_id.to_owned());
        answers.set(question_id, token.value.clone());
        true
    }

    /// Remove `token_id` from its slot, clearing the slot's answer.
    /// Unassigned or unknown tokens are a no-op.
    pub fn unassign(&mut self, answers: &mut AnswerSheet, token_id: &str) -> bool {
        match self.token_to_slot.remove(token_id) {
            Some(slot) => {
                self.slot_to_token.remove(&slot);
                answers.clear(slot);
                true
            }
            None => false,
        }
    }

    /// The slot currently holding `token_id`, if any.
    pub fn slot_of(&self, token_id: &str) -> Option<u32> {
        self.token_to_slot.get(token_id).copied()
    }

    /// The token currently filling `question_id`, if any.
    pub fn token_in(&self, question_id: u32) -> Option<&str> {
        self.slot_to_token.get(&question_id).map(String::as_str)
    }

    /// Only tokens not currently placed in a slot may be dragged.
    pub fn is_draggable(&self, token_id: &str) -> bool {
        !self.token_to_slot.contains_key(token_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BandScale, DragToken, Question, QuestionKind, Skill};

    fn catalog() -> TestCatalog {
        TestCatalog {
            id: "t".into(),
            name: "T".into(),
            description: String::new(),
            skill: Skill::Listening,
            duration_secs: 60,
            passages: vec![],
            tokens: vec![
                DragToken { id: "t1".into(), value: "Kitchen".into() },
                DragToken { id: "t2".into(), value: "Games Room".into() },
            ],
            questions: (16..=18)
                .map(|id| Question {
                    id,
                    kind: QuestionKind::Drag,
                    prompt: format!("q{id}"),
                    answer: "Kitchen".into(),
                    group: 2,
                })
                .collect(),
            band_scale: BandScale::default(),
        }
    }

    #[test]
    fn assign_writes_answer_and_marks_token_used() {
        let catalog = catalog();
        let mut answers = AnswerSheet::new();
        let mut board = DragBoard::new();

        assert!(board.assign(&catalog, &mut answers, "t1", 16));
        assert_eq!(answers.get(16), "Kitchen");
        assert!(!board.is_draggable("t1"));
        assert!(board.is_draggable("t2"));
        assert_eq!(board.token_in(16), Some("t1"));
    }

    #[test]
    fn reassigning_token_vacates_previous_slot() {
        let catalog = catalog();
        let mut answers = AnswerSheet::new();
        let mut board = DragBoard::new();

        board.assign(&catalog, &mut answers, "t1", 16);
        board.assign(&catalog, &mut answers, "t1", 17);

        assert_eq!(answers.get(16), "");
        assert_eq!(answers.get(17), "Kitchen");
        assert_eq!(board.token_in(16), None);
        assert_eq!(board.slot_of("t1"), Some(17));
        assert!(!board.is_draggable("t1"));
    }

    #[test]
    fn slot_receiving_new_token_releases_old_one() {
        let catalog = catalog();
        let mut answers = AnswerSheet::new();
        let mut board = DragBoard::new();

        board.assign(&catalog, &mut answers, "t1", 16);
        board.assign(&catalog, &mut answers, "t2", 16);

        assert_eq!(answers.get(16), "Games Room");
        assert!(board.is_draggable("t1"));
        assert_eq!(board.slot_of("t1"), None);
        assert_eq!(board.token_in(16), Some("t2"));
    }

    #[test]
    fn unassign_clears_both_directions() {
        let catalog = catalog();
        let mut answers = AnswerSheet::new();
        let mut board = DragBoard::new();

        board.assign(&catalog, &mut answers, "t1", 16);
        assert!(board.unassign(&mut answers, "t1"));

        assert_eq!(answers.get(16), "");
        assert!(board.is_draggable("t1"));
        assert_eq!(board.token_in(16), None);
        // A second unassign is a no-op.
        assert!(!board.unassign(&mut answers, "t1"));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let catalog = catalog();
        let mut answers = AnswerSheet::new();
        let mut board = DragBoard::new();

        assert!(!board.assign(&catalog, &mut answers, "nope", 16));
        assert_eq!(answers.get(16), "");
    }
}
