//! Core data model types for bandprep.
//!
//! These are the fundamental types that the entire bandprep system uses
//! to represent test catalogs, passages, questions, and band scales.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single question inside a test catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier, stable for the lifetime of a session.
    pub id: u32,
    /// What kind of question this is, with any per-kind payload.
    pub kind: QuestionKind,
    /// The question text shown to the candidate.
    pub prompt: String,
    /// The correct answer, compared case-insensitively at scoring time.
    pub answer: String,
    /// Passage or part number this question belongs to.
    pub group: u32,
}

/// Question kinds, tagged so render and scoring sites match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Free-text gap fill.
    FillInBlank,
    /// One answer letter out of the listed options.
    MultipleChoice { options: Vec<String> },
    /// TRUE / FALSE / NOT GIVEN (or YES / NO / NOT GIVEN).
    TrueFalseNotGiven,
    /// Match a statement to one of the lettered labels.
    Matching { labels: Vec<String> },
    /// Answered by dropping a token from the catalog's drag pool.
    Drag,
}

impl QuestionKind {
    /// Short name used in validation messages and the navigator display.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::FillInBlank => "fill-in-blank",
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::TrueFalseNotGiven => "true-false-not-given",
            QuestionKind::Matching { .. } => "matching",
            QuestionKind::Drag => "drag",
        }
    }
}

/// A reading passage (or listening part transcript excerpt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: u32,
    pub title: String,
    pub content: String,
}

/// A reusable draggable answer option. Assignment state lives in the
/// session's drag board, not on the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragToken {
    pub id: String,
    pub value: String,
}

/// Which test skill a catalog exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Reading,
    Listening,
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skill::Reading => write!(f, "reading"),
            Skill::Listening => write!(f, "listening"),
        }
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reading" => Ok(Skill::Reading),
            "listening" => Ok(Skill::Listening),
            other => Err(format!("unknown skill: {other}")),
        }
    }
}

/// One step of a band scale: reaching `min_correct` earns `band`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandStep {
    pub min_correct: u32,
    pub band: f64,
}

/// Step function from raw correct count to an estimated band score.
///
/// Steps are kept sorted by `min_correct` descending; the estimate is the
/// band of the first step the correct count reaches, or `floor` below all
/// steps. Monotonic non-decreasing in the correct count by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandScale {
    pub steps: Vec<BandStep>,
    pub floor: f64,
}

impl BandScale {
    pub fn new(mut steps: Vec<BandStep>, floor: f64) -> Self {
        steps.sort_by(|a, b| b.min_correct.cmp(&a.min_correct));
        Self { steps, floor }
    }

    /// The band earned by `correct` answers.
    pub fn estimate(&self, correct: u32) -> f64 {
        self.steps
            .iter()
            .find(|s| correct >= s.min_correct)
            .map(|s| s.band)
            .unwrap_or(self.floor)
    }

    /// True if a higher correct count can never earn a lower band.
    pub fn is_monotonic(&self) -> bool {
        self.steps
            .windows(2)
            .all(|w| w[0].min_correct > w[1].min_correct && w[0].band >= w[1].band)
            && self.steps.last().map_or(true, |s| s.band >= self.floor)
    }
}

impl Default for BandScale {
    /// The Academic Reading scale: 36+ → 8.5, 32+ → 7.5, 28+ → 6.5, else 5.5.
    fn default() -> Self {
        Self::new(
            vec![
                BandStep { min_correct: 36, band: 8.5 },
                BandStep { min_correct: 32, band: 7.5 },
                BandStep { min_correct: 28, band: 6.5 },
            ],
            5.5,
        )
    }
}

/// A complete, immutable test definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCatalog {
    /// Unique identifier for this catalog.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this test.
    #[serde(default)]
    pub description: String,
    /// Which skill this catalog tests.
    pub skill: Skill,
    /// Time allowed, in seconds.
    pub duration_secs: u32,
    /// Reading passages, in presentation order. Empty for listening tests.
    #[serde(default)]
    pub passages: Vec<Passage>,
    /// Pool of draggable answer tokens. Empty when no drag questions exist.
    #[serde(default)]
    pub tokens: Vec<DragToken>,
    /// The questions, in catalog order.
    pub questions: Vec<Question>,
    /// Catalog-specific band thresholds.
    #[serde(default)]
    pub band_scale: BandScale,
}

impl TestCatalog {
    /// Look up a question by id.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Look up the passage a question belongs to, if any.
    pub fn passage_for(&self, question: &Question) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == question.group)
    }

    /// Look up a drag token by id.
    pub fn token(&self, id: &str) -> Option<&DragToken> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// Question ids in catalog order.
    pub fn question_order(&self) -> Vec<u32> {
        self.questions.iter().map(|q| q.id).collect()
    }

    /// Distinct group numbers in first-seen order, for the navigator display.
    pub fn groups(&self) -> Vec<u32> {
        let mut groups = Vec::new();
        for q in &self.questions {
            if !groups.contains(&q.group) {
                groups.push(q.group);
            }
        }
        groups
    }
}
