//! Scoring: compare the answer sheet against the catalog keys.

use serde::{Deserialize, Serialize};

use crate::answers::AnswerSheet;
use crate::model::TestCatalog;

/// The computed outcome of a test, derived on demand from the catalog and
/// the answer sheet. Never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub total_count: u32,
    /// Percentage of questions answered correctly, rounded to one decimal.
    pub accuracy_percent: f64,
    /// Band estimate from the catalog's band scale.
    pub band_estimate: f64,
}

/// True when `user` matches `key` under the marking rules: exact string
/// match, case-insensitive, surrounding whitespace ignored. An empty
/// response never matches.
pub fn is_correct(user: &str, key: &str) -> bool {
    let user = user.trim();
    !user.is_empty() && user.eq_ignore_ascii_case(key.trim())
}

/// Score the sheet against the catalog. Pure and idempotent: the same
/// inputs always produce the same `ScoreResult`.
pub fn score(catalog: &TestCatalog, answers: &AnswerSheet) -> ScoreResult {
    let total_count = catalog.questions.len() as u32;
    let correct_count = catalog
        .questions
        .iter()
        .filter(|q| is_correct(answers.get(q.id), &q.answer))
        .count() as u32;

    let accuracy_percent = if total_count == 0 {
        0.0
    } else {
        round1(f64::from(correct_count) / f64::from(total_count) * 100.0)
    };

    ScoreResult {
        correct_count,
        total_count,
        accuracy_percent,
        band_estimate: catalog.band_scale.estimate(correct_count),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
