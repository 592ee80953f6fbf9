//! The answer sheet: one entry per question, keyed by question id.

use std::collections::HashMap;

use crate::model::TestCatalog;

/// Normalized question-id → response mapping. The single source of truth
/// for what the candidate has answered in a session.
///
/// An empty string means unanswered. Reads of unknown ids return `""`;
/// writes to unknown ids are harmless upserts, so every operation is total.
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    entries: HashMap<u32, String>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `question_id`. No format validation here;
    /// that is a presentation concern.
    pub fn set(&mut self, question_id: u32, value: impl Into<String>) {
        self.entries.insert(question_id, value.into());
    }

    /// Clear the entry for `question_id`.
    pub fn clear(&mut self, question_id: u32) {
        self.entries.remove(&question_id);
    }

    /// The current response, `""` when absent.
    pub fn get(&self, question_id: u32) -> &str {
        self.entries.get(&question_id).map(String::as_str).unwrap_or("")
    }

    pub fn is_answered(&self, question_id: u32) -> bool {
        !self.get(question_id).is_empty()
    }

    /// Number of non-empty entries.
    pub fn answered_count(&self) -> usize {
        self.entries.values().filter(|v| !v.is_empty()).count()
    }

    /// Enumerate `(question_id, response)` pairs in catalog order, one pair
    /// per catalog question, substituting `""` for unanswered questions.
    pub fn in_catalog_order<'a>(
        &'a self,
        catalog: &'a TestCatalog,
    ) -> impl Iterator<Item = (u32, &'a str)> + 'a {
        catalog.questions.iter().map(|q| (q.id, self.get(q.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BandScale, Question, QuestionKind, Skill};

    fn catalog() -> TestCatalog {
        TestCatalog {
            id: "t".into(),
            name: "T".into(),
            description: String::new(),
            skill: Skill::Listening,
            duration_secs: 60,
            passages: vec![],
            tokens: vec![],
            questions: [3u32, 1, 2]
                .iter()
                .map(|&id| Question {
                    id,
                    kind: QuestionKind::FillInBlank,
                    prompt: format!("q{id}"),
                    answer: "x".into(),
                    group: 1,
                })
                .collect(),
            band_scale: BandScale::default(),
        }
    }

    #[test]
    fn last_write_wins() {
        let mut sheet = AnswerSheet::new();
        sheet.set(1, "first");
        sheet.set(2, "other");
        sheet.set(1, "second");
        assert_eq!(sheet.get(1), "second");
        assert_eq!(sheet.get(2), "other");
    }

    #[test]
    fn unknown_id_reads_empty() {
        let sheet = AnswerSheet::new();
        assert_eq!(sheet.get(99), "");
        assert!(!sheet.is_answered(99));
    }

    #[test]
    fn answered_count_skips_empty_values() {
        let mut sheet = AnswerSheet::new();
        sheet.set(1, "a");
        sheet.set(2, "");
        sheet.set(3, "c");
        assert_eq!(sheet.answered_count(), 2);
    }

    #[test]
    fn clear_resets_to_unanswered() {
        let mut sheet = AnswerSheet::new();
        sheet.set(1, "a");
        sheet.clear(1);
        assert_eq!(sheet.get(1), "");
    }

    #[test]
    fn enumeration_follows_catalog_order() {
        let catalog = catalog();
        let mut sheet = AnswerSheet::new();
        sheet.set(2, "two");
        let pairs: Vec<(u32, &str)> = sheet.in_catalog_order(&catalog).collect();
        assert_eq!(pairs, vec![(3, ""), (1, ""), (2, "two")]);
    }
}
