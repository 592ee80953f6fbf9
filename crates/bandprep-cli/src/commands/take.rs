//! The `bandprep take` command: run one timed practice session.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use bandprep_core::explain::{ExplanationPipeline, PipelineConfig, Progress};
use bandprep_core::model::{QuestionKind, TestCatalog};
use bandprep_core::nav::QuestionStatus;
use bandprep_core::parser;
use bandprep_core::report::SessionReport;
use bandprep_core::session::{Phase, TestSession};
use bandprep_core::timer::Countdown;
use bandprep_core::traits::IdentityProvider;
use bandprep_providers::config::{default_identity_cache_path, load_config_from, BandprepConfig};
use bandprep_providers::identity::SupabaseIdentity;
use bandprep_providers::profile::{record_result, SupabaseProfile};
use bandprep_providers::create_explainer;
use bandprep_report::write_html_report;

/// Console progress for the explanation pipeline.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn on_question_start(&self, question_id: u32) {
        eprintln!("  Explaining question {question_id}...");
    }

    fn on_question_done(&self, question_id: u32, used_fallback: bool) {
        if used_fallback {
            eprintln!("  Question {question_id}: generation unavailable, using fallback");
        }
    }

    fn on_complete(&self, total: usize, fallbacks: usize, elapsed: Duration) {
        eprintln!(
            "Explanations ready: {total} generated, {fallbacks} fallback(s) ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

enum TimerEvent {
    Tick,
    Expired,
}

enum Flow {
    Continue,
    Submit,
}

pub async fn execute(
    catalog_path: PathBuf,
    offline: bool,
    duration_secs: Option<u32>,
    output: PathBuf,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = if offline {
        BandprepConfig::default()
    } else {
        load_config_from(config_path.as_deref())?
    };

    let mut catalog = parser::load_catalog(&catalog_path)?;
    for warning in parser::validate_catalog(&catalog) {
        tracing::warn!(
            "catalog {}: {}{}",
            catalog.id,
            warning
                .question_id
                .map(|id| format!("[{id}] "))
                .unwrap_or_default(),
            warning.message
        );
    }
    if let Some(duration) = duration_secs {
        catalog.duration_secs = duration;
    }

    // A cached sign-in names the candidate on the report; nothing here
    // touches the network before the test starts.
    let identity = if offline {
        None
    } else {
        config.identity.as_ref().map(|idc| {
            let cache = idc.cache_path.clone().or_else(default_identity_cache_path);
            SupabaseIdentity::with_cache(&idc.base_url, &idc.anon_key, cache)
        })
    };
    let auth = identity.as_ref().and_then(|i| i.session());
    let candidate = auth
        .as_ref()
        .map(|s| s.name.clone().unwrap_or_else(|| s.email.clone()));

    print_tutorial(&catalog);
    println!("Press Enter to start the test.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let _ = lines.next_line().await;

    let mut session = TestSession::new(catalog);
    session.begin();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let tick_tx = tx.clone();
    let mut clock = Countdown::start(
        session.time_remaining(),
        move |_| {
            let _ = tick_tx.send(TimerEvent::Tick);
        },
        move || {
            let _ = tx.send(TimerEvent::Expired);
        },
    );

    println!(
        "\nTest started: {} questions, {} minutes. Type `help` for commands.\n",
        session.catalog().questions.len(),
        session.catalog().duration_secs / 60
    );
    print_question(&session);

    while session.phase() == Phase::InProgress {
        tokio::select! {
            event = rx.recv() => match event {
                Some(TimerEvent::Tick) => {
                    let remaining = session.time_remaining().saturating_sub(1);
                    if remaining == 300 || remaining == 60 {
                        println!("** {} remaining **", format_clock(remaining));
                    }
                    if session.tick() == Phase::Submitted {
                        println!("\nTime is up — the test has been submitted automatically.");
                    }
                }
                Some(TimerEvent::Expired) | None => {
                    session.submit();
                }
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Flow::Submit = handle_command(&mut session, line.trim()) {
                        session.submit();
                    }
                }
                // End of input submits whatever is on the sheet.
                None => {
                    session.submit();
                }
            },
        }
    }
    clock.stop();

    let score = session
        .result()
        .cloned()
        .context("session ended without a score")?;

    println!("\nGenerating explanations...");
    let provider = create_explainer(&config);
    let pipeline = ExplanationPipeline::new(
        provider,
        PipelineConfig {
            target_language: config.target_language.clone(),
            ..PipelineConfig::default()
        },
    );
    let batch = pipeline
        .generate(session.catalog(), session.answers(), &ConsoleProgress)
        .await;

    let report = SessionReport::from_session(&session, batch, candidate)
        .context("session was not submitted")?;

    std::fs::create_dir_all(&output)?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').collect()
    };
    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("session-{timestamp}.json"));
                report.save_json(&path)?;
                println!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("session-{timestamp}.html"));
                write_html_report(&report, &path)?;
                println!("Results page: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    print_summary(&report);

    // Fold the result into the candidate's stats; a dead data API must
    // never disturb the results that were just printed.
    if let (Some(auth), Some(identity_config)) = (auth, config.identity.as_ref()) {
        let store = SupabaseProfile::new(&identity_config.base_url, &identity_config.anon_key);
        let completion = if score.total_count == 0 {
            0.0
        } else {
            session.answers().answered_count() as f64 / f64::from(score.total_count) * 100.0
        };
        let today = chrono::Utc::now().date_naive();
        match record_result(&store, &auth, &score, completion, today).await {
            Ok(stats) => println!(
                "Progress saved: {} tests taken, average score {:.1}%.",
                stats.quizzes_taken, stats.average_score
            ),
            Err(e) => tracing::warn!("could not record practice stats: {e:#}"),
        }
    }

    Ok(())
}

fn print_tutorial(catalog: &TestCatalog) {
    println!("Welcome to the {} tutorial", catalog.name);
    println!();
    println!(
        "Each part of the test has more than one type of question, and each \
         type of question has its own instructions. For some questions you \
         type your answer; for some you choose an answer; for some you move \
         an answer token into a gap."
    );
    println!(
        "You can flag any question to revisit it before submitting, and move \
         between questions freely. The test will automatically stop when the \
         time finishes."
    );
    println!();
}

fn handle_command(session: &mut TestSession, line: &str) -> Flow {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");

    match command {
        "" => {}
        "a" | "answer" => {
            let id = parts.next().and_then(|s| s.parse::<u32>().ok());
            let value = parts.collect::<Vec<_>>().join(" ");
            match id {
                Some(id) if session.catalog().question(id).is_some() => {
                    session.set_answer(id, value);
                    session.go_to(id);
                    println!("Question {id}: recorded.");
                }
                _ => println!("Usage: answer <question> <text>"),
            }
        }
        "d" | "drag" => {
            let token = parts.next().unwrap_or("");
            let id = parts.next().and_then(|s| s.parse::<u32>().ok());
            match id {
                Some(id) => {
                    if session.assign_token(token, id) {
                        println!("Placed '{token}' into question {id}.");
                    } else {
                        println!("Cannot place '{token}' there. Try `tokens`.");
                    }
                }
                None => println!("Usage: drag <token-id> <question>"),
            }
        }
        "u" | "undrag" => {
            let token = parts.next().unwrap_or("");
            if session.unassign_token(token) {
                println!("Returned '{token}' to the pool.");
            } else {
                println!("'{token}' is not placed anywhere.");
            }
        }
        "g" | "goto" => match parts.next().and_then(|s| s.parse::<u32>().ok()) {
            Some(id) => {
                session.go_to(id);
                print_question(session);
            }
            None => println!("Usage: goto <question>"),
        },
        "n" | "next" => {
            session.next_question();
            print_question(session);
        }
        "p" | "prev" => {
            session.prev_question();
            print_question(session);
        }
        "f" | "flag" => {
            let id = parts
                .next()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or_else(|| session.current_question());
            let flagged = session.toggle_review(id);
            println!(
                "Question {id} {}.",
                if flagged { "flagged for review" } else { "unflagged" }
            );
        }
        "b" | "board" => print_board(session),
        "tokens" => print_tokens(session),
        "t" | "time" => println!("{} remaining", format_clock(session.time_remaining())),
        "s" | "show" => print_question(session),
        "help" | "?" => print_help(),
        "submit" | "q" | "quit" => return Flow::Submit,
        other => println!("Unknown command '{other}'. Type `help` for commands."),
    }
    Flow::Continue
}

fn print_help() {
    println!("Commands:");
    println!("  answer <q> <text>   record an answer (a)");
    println!("  drag <token> <q>    move a token into a gap (d)");
    println!("  undrag <token>      return a token to the pool (u)");
    println!("  goto <q> / next / prev    move around (g, n, p)");
    println!("  flag [q]            toggle the review flag (f)");
    println!("  board               question overview (b)");
    println!("  tokens              drag-token pool");
    println!("  time                remaining time (t)");
    println!("  show                current question (s)");
    println!("  submit              finish the test (q)");
}

fn print_question(session: &TestSession) {
    let id = session.current_question();
    let Some(question) = session.catalog().question(id) else {
        return;
    };
    println!("Question {id}: {}", question.prompt);
    match &question.kind {
        QuestionKind::FillInBlank => println!("  (type: answer {id} <text>)"),
        QuestionKind::MultipleChoice { options } => {
            for option in options {
                println!("  {option}");
            }
            println!("  (choose a letter: answer {id} <letter>)");
        }
        QuestionKind::TrueFalseNotGiven => {
            println!("  (answer {id} TRUE | FALSE | NOT GIVEN)");
        }
        QuestionKind::Matching { labels } => {
            println!("  (match a label: answer {id} {})", labels.join("/"));
        }
        QuestionKind::Drag => {
            match session.board().token_in(id) {
                Some(token) => println!("  currently holds token '{token}'"),
                None => println!("  (drop a token: drag <token-id> {id}; see `tokens`)"),
            }
        }
    }
}

fn print_board(session: &TestSession) {
    for group in session.catalog().groups() {
        let mut row = format!("Part {group}:");
        for question in session
            .catalog()
            .questions
            .iter()
            .filter(|q| q.group == group)
        {
            let mark = match session.status(question.id) {
                QuestionStatus::Current => format!("[{}]", question.id),
                QuestionStatus::Flagged => format!("?{}", question.id),
                QuestionStatus::Answered => format!("+{}", question.id),
                QuestionStatus::Unanswered => format!(" {}", question.id),
            };
            row.push(' ');
            row.push_str(&mark);
        }
        println!("{row}");
    }
    println!("(current [n], flagged ?n, answered +n)");
}

fn print_tokens(session: &TestSession) {
    println!("Token pool:");
    for token in &session.catalog().tokens {
        match session.board().slot_of(&token.id) {
            Some(slot) => println!("  {} = \"{}\" (in question {slot})", token.id, token.value),
            None => println!("  {} = \"{}\"", token.id, token.value),
        }
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub(crate) fn print_summary(report: &SessionReport) {
    use comfy_table::Table;

    let mut table = Table::new();
    table.set_header(vec!["Correct", "Accuracy", "Estimated Band", "Time Used"]);
    table.add_row(vec![
        format!("{}/{}", report.score.correct_count, report.score.total_count),
        format!("{:.1}%", report.score.accuracy_percent),
        format!("{:.1}", report.score.band_estimate),
        format_clock(report.time_used_secs),
    ]);

    println!("\n{table}");

    if !report.flagged_questions.is_empty() {
        println!(
            "Still flagged at submission: {}",
            report
                .flagged_questions
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
