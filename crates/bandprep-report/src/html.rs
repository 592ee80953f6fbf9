//! HTML results page generator.
//!
//! Produces a self-contained HTML file with all CSS inlined: the score
//! summary, every question with the candidate's answer against the key,
//! and the generated explanations.

use anyhow::Result;
use std::path::Path;

use bandprep_core::report::SessionReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the results page for one session report.
pub fn generate_html(report: &SessionReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Test results — {}</title>\n",
        html_escape(&report.catalog.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Test Results</h1>\n");
    let candidate = report
        .candidate
        .as_deref()
        .map(|name| format!(" | Candidate: <strong>{}</strong>", html_escape(name)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">{} ({}) | {} questions{} | {}</p>\n",
        html_escape(&report.catalog.name),
        report.catalog.skill,
        report.catalog.question_count,
        candidate,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score tiles
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<div class=\"tiles\">\n");
    html.push_str(&format!(
        "<div class=\"tile\"><div class=\"big\">{}/{}</div><div>Correct Answers</div></div>\n",
        report.score.correct_count, report.score.total_count
    ));
    html.push_str(&format!(
        "<div class=\"tile\"><div class=\"big\">{:.1}%</div><div>Accuracy</div></div>\n",
        report.score.accuracy_percent
    ));
    html.push_str(&format!(
        "<div class=\"tile\"><div class=\"big\">{:.1}</div><div>Estimated Band</div></div>\n",
        report.score.band_estimate
    ));
    html.push_str(&format!(
        "<div class=\"tile\"><div class=\"big\">{}:{:02}</div><div>Time Used</div></div>\n",
        report.time_used_secs / 60,
        report.time_used_secs % 60
    ));
    html.push_str("</div>\n</section>\n");

    // Per-question table
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Answers</h2>\n");
    html.push_str("<table class=\"answers\">\n");
    html.push_str(
        "<thead><tr><th>#</th><th>Question</th><th>Your answer</th><th>Correct answer</th><th>Result</th></tr></thead>\n",
    );
    html.push_str("<tbody>\n");
    for record in &report.answers {
        let (class, verdict) = if record.is_correct {
            ("correct", "Correct")
        } else {
            ("incorrect", "Incorrect")
        };
        let user = if record.user_answer.is_empty() {
            "<em>Not answered</em>".to_string()
        } else {
            html_escape(&record.user_answer)
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            record.question_id,
            html_escape(&record.prompt),
            user,
            html_escape(&record.correct_answer),
            verdict
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Explanations
    if !report.explanations.is_empty() {
        html.push_str("<section class=\"explanations\">\n");
        html.push_str("<h2>Explanations</h2>\n");
        for record in &report.answers {
            let Some(explanation) = report.explanations.get(&record.question_id) else {
                continue;
            };
            html.push_str("<article class=\"explanation\">\n");
            html.push_str(&format!(
                "<h3>Question {}</h3>\n",
                record.question_id
            ));
            if !explanation.keywords.is_empty() {
                html.push_str("<h4>Keywords</h4>\n<ul class=\"keywords\">\n");
                for keyword in &explanation.keywords {
                    html.push_str(&format!(
                        "<li><strong>{}</strong>: {} <span class=\"source\">({})</span></li>\n",
                        html_escape(&keyword.word),
                        html_escape(&keyword.translation),
                        html_escape(&keyword.source_label)
                    ));
                }
                html.push_str("</ul>\n");
            }
            html.push_str(&format!(
                "<p>{}</p>\n",
                html_escape(&explanation.explanation_text)
            ));
            html.push_str(&format!(
                "<blockquote class=\"keysentence\">{}</blockquote>\n",
                html_escape(&explanation.key_sentence)
            ));
            if !explanation.reasoning_points.is_empty() {
                html.push_str("<ul class=\"reasoning\">\n");
                for point in &explanation.reasoning_points {
                    html.push_str(&format!("<li>{}</li>\n", html_escape(point)));
                }
                html.push_str("</ul>\n");
            }
            if report.fallback_questions.contains(&record.question_id) {
                html.push_str(
                    "<p class=\"fallback-note\">Generated explanation was unavailable; showing a generic summary.</p>\n",
                );
            }
            html.push_str("</article>\n");
        }
        html.push_str("</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the results page to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --ok: #dcfce7; --bad: #fde2e2; --accent: #2563eb; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --ok: #064e3b; --bad: #7f1d1d; --accent: #60a5fa; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); max-width: 72rem; }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.tiles { display: flex; gap: 1rem; flex-wrap: wrap; }
.tile { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 2rem; text-align: center; }
.tile .big { font-size: 2rem; font-weight: bold; color: var(--accent); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
tr.correct { background: var(--ok); }
tr.incorrect { background: var(--bad); }
.explanation { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; margin: 1rem 0; }
.keysentence { border-left: 4px solid var(--accent); margin: 1rem 0; padding: 0.5rem 1rem; font-style: italic; }
.keywords .source { color: #6b7280; }
.fallback-note { color: #6b7280; font-size: 0.85rem; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
