//! The `leitbox init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create leitbox.toml
    if std::path::Path::new("leitbox.toml").exists() {
        println!("leitbox.toml already exists, skipping.");
    } else {
        std::fs::write("leitbox.toml", SAMPLE_CONFIG)?;
        println!("Created leitbox.toml");
    }

    // Create the data directory the sample config points at
    std::fs::create_dir_all("leitbox-data")?;
    println!("Created leitbox-data/");

    println!("\nNext steps:");
    println!("  1. Edit leitbox.toml with your API key (or keep the mock extractor)");
    println!("  2. Run: leitbox add-words --words \"hola,adios\" --users 1");
    println!("  3. Run: leitbox review --user 1 --answers correct,wrong");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# leitbox configuration

# Switch to "openai" once an API key is configured.
default_extractor = "mock"

source_language = "en"
target_language = "es"
data_path = "./leitbox-data/store.json"

# Review interval per box, in minutes, box 1 first:
# 10 minutes, 1 day, 3 days, 1 week, 3 weeks.
box_interval_minutes = [10, 1440, 4320, 10080, 30240]

session_idle_minutes = 30
assignment_retention_minutes = 30
extract_timeout_secs = 20

[extractors.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4o-mini"

[extractors.mock]
type = "mock"
"#;
