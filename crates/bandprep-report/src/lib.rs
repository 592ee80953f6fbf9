//! bandprep-report — renders session reports as shareable documents.

pub mod html;

pub use html::{generate_html, write_html_report};
