//! The `bandprep init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create bandprep.toml
    if std::path::Path::new("bandprep.toml").exists() {
        println!("bandprep.toml already exists, skipping.");
    } else {
        std::fs::write("bandprep.toml", SAMPLE_CONFIG)?;
        println!("Created bandprep.toml");
    }

    // Create example catalog
    std::fs::create_dir_all("catalogs")?;
    let example_path = std::path::Path::new("catalogs/example.toml");
    if example_path.exists() {
        println!("catalogs/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalogs/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit bandprep.toml with your API keys (or keep type = \"mock\" for offline use)");
    println!("  2. Run: bandprep validate --catalog catalogs/example.toml");
    println!("  3. Run: bandprep take --catalog catalogs/example.toml --offline");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# bandprep configuration

target_language = "Vietnamese"
catalog_dir = "./catalogs"
output_dir = "./bandprep-results"

# Explanation generation. Switch type to "gemini" and set the key to get
# AI explanations; "mock" works fully offline.
[generation]
type = "mock"
# type = "gemini"
# api_key = "${GEMINI_API_KEY}"
# model = "gemini-2.0-flash"

# Identity service for accounts and practice stats (optional).
# [identity]
# base_url = "https://your-project.supabase.co"
# anon_key = "${SUPABASE_ANON_KEY}"
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example-listening"
name = "Example Listening Test"
description = "A five-minute sample to try the commands"
skill = "listening"
duration_secs = 300

[band_scale]
floor = 5.5
steps = [
    { min_correct = 4, band = 8.0 },
    { min_correct = 3, band = 6.5 },
]

[[tokens]]
id = "kitchen"
value = "Kitchen"

[[tokens]]
id = "games-room"
value = "Games Room"

[[questions]]
id = 1
kind = "fill-in-blank"
prompt = "Dining table: ___ shape"
answer = "round"
group = 1

[[questions]]
id = 2
kind = "true-false-not-given"
prompt = "The table is two years old."
answer = "TRUE"
group = 1

[[questions]]
id = 3
kind = "multiple-choice"
prompt = "The chairs are covered in:"
answer = "B"
group = 1
options = ["A. Cotton", "B. Leather", "C. Wool"]

[[questions]]
id = 4
kind = "drag"
prompt = "Room beside the staff lounge"
answer = "Kitchen"
group = 2
"#;
