//! The `bandprep validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let catalogs = if catalog_path.is_dir() {
        bandprep_core::parser::load_catalog_directory(&catalog_path)?
    } else {
        vec![bandprep_core::parser::load_catalog(&catalog_path)?]
    };

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} questions, {} minutes)",
            catalog.name,
            catalog.questions.len(),
            catalog.duration_secs / 60,
        );

        let warnings = bandprep_core::parser::validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
