//! Session report types with JSON persistence.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::AnswerSheet;
use crate::explain::{Explanation, ExplanationBatch};
use crate::model::{Skill, TestCatalog};
use crate::scoring::{is_correct, ScoreResult};
use crate::session::TestSession;

/// Everything the results view needs, persisted as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the catalog taken.
    pub catalog: CatalogSummary,
    /// Display name of the candidate, when signed in.
    #[serde(default)]
    pub candidate: Option<String>,
    /// The computed score.
    pub score: ScoreResult,
    /// Per-question record, in catalog order.
    pub answers: Vec<AnswerRecord>,
    /// Explanations keyed by question id.
    #[serde(default)]
    pub explanations: HashMap<u32, Explanation>,
    /// Questions whose explanation is fallback content.
    #[serde(default)]
    pub fallback_questions: Vec<u32>,
    /// Questions still flagged for review at submission.
    #[serde(default)]
    pub flagged_questions: Vec<u32>,
    /// Seconds spent before submitting.
    pub time_used_secs: u32,
}

/// Summary of a catalog (without passages and keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub skill: Skill,
    pub question_count: usize,
}

/// One question's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: u32,
    pub prompt: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl SessionReport {
    /// Assemble a report from a submitted session and its explanation
    /// batch. Returns `None` while the session has no score yet.
    pub fn from_session(
        session: &TestSession,
        batch: ExplanationBatch,
        candidate: Option<String>,
    ) -> Option<Self> {
        let score = session.result()?.clone();
        let catalog = session.catalog();
        Some(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            catalog: CatalogSummary {
                id: catalog.id.clone(),
                name: catalog.name.clone(),
                skill: catalog.skill,
                question_count: catalog.questions.len(),
            },
            candidate,
            score,
            answers: answer_records(catalog, session.answers()),
            explanations: batch.explanations,
            fallback_questions: batch.fallbacks,
            flagged_questions: session.flagged(),
            time_used_secs: session.time_used(),
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

fn answer_records(catalog: &TestCatalog, answers: &AnswerSheet) -> Vec<AnswerRecord> {
    catalog
        .questions
        .iter()
        .map(|q| {
            let user = answers.get(q.id);
            AnswerRecord {
                question_id: q.id,
                prompt: q.prompt.clone(),
                user_answer: user.to_owned(),
                correct_answer: q.answer.clone(),
                is_correct: is_correct(user, &q.answer),
            }
        })
        .collect()
}
