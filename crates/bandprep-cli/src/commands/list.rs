//! The `bandprep list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::Table;

use bandprep_providers::config::load_config_from;

pub fn execute(catalog_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let dir = match catalog_dir {
        Some(dir) => dir,
        None => load_config_from(config_path.as_deref())?.catalog_dir,
    };

    let catalogs = bandprep_core::parser::load_catalog_directory(&dir)?;

    if catalogs.is_empty() {
        println!(
            "No catalogs found in {}. Run `bandprep init` to create an example.",
            dir.display()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Skill", "Questions", "Minutes"]);
    for catalog in &catalogs {
        table.add_row(vec![
            catalog.id.clone(),
            catalog.name.clone(),
            catalog.skill.to_string(),
            catalog.questions.len().to_string(),
            (catalog.duration_secs / 60).to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}
