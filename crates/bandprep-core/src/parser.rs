//! TOML test-catalog parser.
//!
//! Loads test catalogs from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    BandScale, BandStep, DragToken, Passage, Question, QuestionKind, Skill, TestCatalog,
};

/// Default matching labels, A through H.
fn default_labels() -> Vec<String> {
    ('A'..='H').map(|c| c.to_string()).collect()
}

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    band_scale: Option<TomlBandScale>,
    #[serde(default)]
    passages: Vec<TomlPassage>,
    #[serde(default)]
    tokens: Vec<TomlToken>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    skill: String,
    duration_secs: u32,
}

#[derive(Debug, Deserialize)]
struct TomlBandScale {
    #[serde(default)]
    steps: Vec<TomlBandStep>,
    floor: f64,
}

#[derive(Debug, Deserialize)]
struct TomlBandStep {
    min_correct: u32,
    band: f64,
}

#[derive(Debug, Deserialize)]
struct TomlPassage {
    id: u32,
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct TomlToken {
    id: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u32,
    kind: String,
    prompt: String,
    answer: String,
    group: u32,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    labels: Option<Vec<String>>,
}

/// Parse a single TOML file into a `TestCatalog`.
pub fn load_catalog(path: &Path) -> Result<TestCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `TestCatalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<TestCatalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let skill: Skill = parsed
        .catalog
        .skill
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;

    anyhow::ensure!(
        !parsed.questions.is_empty(),
        "catalog '{}' has no questions",
        parsed.catalog.id
    );

    let band_scale = match parsed.band_scale {
        Some(scale) => BandScale::new(
            scale
                .steps
                .into_iter()
                .map(|s| BandStep { min_correct: s.min_correct, band: s.band })
                .collect(),
            scale.floor,
        ),
        None => BandScale::default(),
    };

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind = match q.kind.as_str() {
                "fill-in-blank" => QuestionKind::FillInBlank,
                "multiple-choice" => QuestionKind::MultipleChoice { options: q.options },
                "true-false-not-given" => QuestionKind::TrueFalseNotGiven,
                "matching" => QuestionKind::Matching {
                    labels: q.labels.unwrap_or_else(default_labels),
                },
                "drag" => QuestionKind::Drag,
                other => anyhow::bail!("question {}: unknown kind '{other}'", q.id),
            };
            Ok(Question {
                id: q.id,
                kind,
                prompt: q.prompt,
                answer: q.answer,
                group: q.group,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TestCatalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        skill,
        duration_secs: parsed.catalog.duration_secs,
        passages: parsed
            .passages
            .into_iter()
            .map(|p| Passage { id: p.id, title: p.title, content: p.content })
            .collect(),
        tokens: parsed
            .tokens
            .into_iter()
            .map(|t| DragToken { id: t.id, value: t.value })
            .collect(),
        questions,
        band_scale,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<TestCatalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match load_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question id (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate a catalog for common authoring mistakes.
pub fn validate_catalog(catalog: &TestCatalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate question ids
    let mut seen_ids = std::collections::HashSet::new();
    for q in &catalog.questions {
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate question id: {}", q.id),
            });
        }
    }

    // Check for empty prompts and answers
    for q in &catalog.questions {
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "prompt is empty".into(),
            });
        }
        if q.answer.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "answer key is empty".into(),
            });
        }
    }

    // Choice questions need options; keys should be one of them
    for q in &catalog.questions {
        match &q.kind {
            QuestionKind::MultipleChoice { options } => {
                if options.is_empty() {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id),
                        message: "multiple-choice question has no options".into(),
                    });
                } else if !options
                    .iter()
                    .any(|o| o.chars().next().is_some_and(|c| c.to_string() == q.answer))
                {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id),
                        message: format!("answer '{}' matches no option letter", q.answer),
                    });
                }
            }
            QuestionKind::Matching { labels } => {
                if !labels.contains(&q.answer) {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id),
                        message: format!("answer '{}' is not one of the labels", q.answer),
                    });
                }
            }
            _ => {}
        }
    }

    // Drag answers must exist in the token pool
    for q in &catalog.questions {
        if matches!(q.kind, QuestionKind::Drag)
            && !catalog.tokens.iter().any(|t| t.value == q.answer)
        {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("drag answer '{}' is not in the token pool", q.answer),
            });
        }
    }

    // Reading questions should reference an existing passage
    if catalog.skill == Skill::Reading {
        for q in &catalog.questions {
            if !catalog.passages.iter().any(|p| p.id == q.group) {
                warnings.push(ValidationWarning {
                    question_id: Some(q.id),
                    message: format!("group {} has no matching passage", q.group),
                });
            }
        }
    }

    if !catalog.band_scale.is_monotonic() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "band scale is not monotonic".into(),
        });
    }

    if catalog.duration_secs == 0 {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "duration is zero; the test would expire immediately".into(),
        });
    }

    warnings
}
