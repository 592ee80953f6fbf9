//! End-to-end session tests driving the library the way the CLI does:
//! catalog from disk, timed session, explanation pipeline, report files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bandprep_core::explain::{ExplanationPipeline, NoopProgress, PipelineConfig};
use bandprep_core::nav::QuestionStatus;
use bandprep_core::parser::load_catalog;
use bandprep_core::report::SessionReport;
use bandprep_core::session::{Phase, TestSession};
use bandprep_core::timer::Countdown;
use bandprep_providers::mock::{MockExplainer, MockReply};
use bandprep_report::generate_html;

fn listening_catalog() -> bandprep_core::model::TestCatalog {
    load_catalog(Path::new("../../catalogs/listening-1.toml")).unwrap()
}

#[test]
fn scenario_three_answers_two_correct() {
    let mut session = TestSession::new(listening_catalog());
    session.begin();
    session.set_answer(1, "round");
    session.set_answer(2, "2");
    session.set_answer(3, "x");

    let score = session.submit().unwrap();
    assert_eq!(score.correct_count, 2);
    assert_eq!(score.total_count, 28);
    assert_eq!(score.accuracy_percent, 7.1);
}

#[tokio::test(start_paused = true)]
async fn scenario_timer_expiry_submits_session() {
    let catalog = {
        let mut catalog = listening_catalog();
        catalog.duration_secs = 5;
        catalog
    };
    let mut session = TestSession::new(catalog);
    session.begin();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _clock = Countdown::start(
        session.time_remaining(),
        move |_| {
            let _ = tx.send(());
        },
        || {},
    );

    let mut ticks = 0;
    while session.phase() == Phase::InProgress {
        rx.recv().await.unwrap();
        ticks += 1;
        session.tick();
        assert!(ticks <= 5, "session failed to submit after expiry");
    }

    assert_eq!(ticks, 5);
    assert_eq!(session.phase(), Phase::Submitted);
    assert!(session.result().is_some());
}

#[test]
fn scenario_review_flag_priority() {
    let mut session = TestSession::new(listening_catalog());
    session.begin();

    session.toggle_review(7);
    session.set_answer(7, "7");

    // Flagged outranks answered while the candidate is elsewhere.
    assert_eq!(session.status(7), QuestionStatus::Flagged);

    session.go_to(7);
    assert_eq!(session.status(7), QuestionStatus::Current);

    session.toggle_review(7);
    session.go_to(1);
    assert_eq!(session.status(7), QuestionStatus::Answered);
}

#[test]
fn drag_workflow_through_the_session() {
    let mut session = TestSession::new(listening_catalog());
    session.begin();

    // Kitchen belongs in 18; dropped on 16 first, then moved.
    assert!(session.assign_token("kitchen", 16));
    assert!(session.assign_token("kitchen", 18));
    assert_eq!(session.answers().get(16), "");
    assert_eq!(session.answers().get(18), "Kitchen");

    // The slot keeps only its latest token.
    assert!(session.assign_token("games-room", 16));
    assert!(session.assign_token("pottery-room", 16));
    assert_eq!(session.answers().get(16), "Pottery Room");
    assert!(session.board().is_draggable("games-room"));

    let score = session.submit().unwrap();
    assert_eq!(score.correct_count, 1);
}

#[tokio::test]
async fn full_pipeline_with_a_failing_question() {
    let mut session = TestSession::new(listening_catalog());
    session.begin();
    session.set_answer(1, "round");
    session.set_answer(2, "2");
    session.set_answer(21, "C");
    session.submit();

    let mut replies = HashMap::new();
    replies.insert(2, MockReply::Garbage);
    let provider = Arc::new(MockExplainer::with_replies(replies));
    let pipeline = ExplanationPipeline::new(provider, PipelineConfig::default());

    let batch = pipeline
        .generate(session.catalog(), session.answers(), &NoopProgress)
        .await;

    // Every answered question is explained; the garbage reply degraded
    // to fallback content without disturbing its neighbours.
    assert_eq!(batch.explanations.len(), 3);
    assert_eq!(batch.fallbacks, vec![2]);
    assert!(!batch.explanations[&2].explanation_text.is_empty());

    let report = SessionReport::from_session(&session, batch, Some("Lan".into())).unwrap();
    assert_eq!(report.score.correct_count, 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.save_json(&path).unwrap();
    let loaded = SessionReport::load_json(&path).unwrap();
    assert_eq!(loaded.fallback_questions, vec![2]);

    let html = generate_html(&loaded);
    assert!(html.contains("Lan"));
    assert!(html.contains("Question 2"));
    assert!(html.contains("showing a generic summary"));
}
