//! The `bandprep review` command: print a saved session report.

use std::path::PathBuf;

use anyhow::Result;

use bandprep_core::report::SessionReport;

pub fn execute(report_path: PathBuf, show_explanations: bool) -> Result<()> {
    let report = SessionReport::load_json(&report_path)?;

    println!(
        "{} ({}) — taken {}",
        report.catalog.name,
        report.catalog.skill,
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(candidate) = &report.candidate {
        println!("Candidate: {candidate}");
    }

    super::take::print_summary(&report);

    println!();
    for record in &report.answers {
        let verdict = if record.is_correct { "correct" } else { "incorrect" };
        let user = if record.user_answer.is_empty() {
            "(not answered)"
        } else {
            record.user_answer.as_str()
        };
        println!(
            "{:>3}. {verdict:>9}  yours: {user}  key: {}",
            record.question_id, record.correct_answer
        );

        if show_explanations {
            if let Some(explanation) = report.explanations.get(&record.question_id) {
                for keyword in &explanation.keywords {
                    println!(
                        "       {} = {} ({})",
                        keyword.word, keyword.translation, keyword.source_label
                    );
                }
                println!("       {}", explanation.explanation_text);
                println!("       Key sentence: \"{}\"", explanation.key_sentence);
                for point in &explanation.reasoning_points {
                    println!("       - {point}");
                }
            }
        }
    }

    Ok(())
}
