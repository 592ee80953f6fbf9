use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bandprep_core::answers::AnswerSheet;
use bandprep_core::model::{BandScale, Question, QuestionKind, Skill, TestCatalog};
use bandprep_core::scoring::score;

fn make_catalog(questions: u32) -> TestCatalog {
    TestCatalog {
        id: "bench".into(),
        name: "Bench".into(),
        description: String::new(),
        skill: Skill::Reading,
        duration_secs: 3600,
        passages: vec![],
        tokens: vec![],
        questions: (1..=questions)
            .map(|id| Question {
                id,
                kind: QuestionKind::FillInBlank,
                prompt: format!("question {id}"),
                answer: format!("answer-{id}"),
                group: 1 + id / 14,
            })
            .collect(),
        band_scale: BandScale::default(),
    }
}

fn make_answers(questions: u32) -> AnswerSheet {
    let mut answers = AnswerSheet::new();
    for id in 1..=questions {
        // Half correct (case-shifted), half wrong.
        if id % 2 == 0 {
            answers.set(id, format!("ANSWER-{id}"));
        } else {
            answers.set(id, "wrong");
        }
    }
    answers
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    let catalog = make_catalog(40);
    let answers = make_answers(40);
    group.bench_function("40 questions", |b| {
        b.iter(|| score(black_box(&catalog), black_box(&answers)))
    });

    let big_catalog = make_catalog(400);
    let big_answers = make_answers(400);
    group.bench_function("400 questions", |b| {
        b.iter(|| score(black_box(&big_catalog), black_box(&big_answers)))
    });

    group.finish();
}

fn bench_band_estimate(c: &mut Criterion) {
    let scale = BandScale::default();
    c.bench_function("band_estimate", |b| {
        b.iter(|| {
            for correct in 0..=40u32 {
                black_box(scale.estimate(black_box(correct)));
            }
        })
    });
}

criterion_group!(benches, bench_score, bench_band_estimate);
criterion_main!(benches);
