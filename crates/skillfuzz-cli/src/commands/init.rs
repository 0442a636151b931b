//! The `skillfuzz init` command.

use std::path::Path;

use anyhow::Result;
use skillfuzz_core::pipeline::{quiz, topic};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("skillfuzz.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("pipelines")?;
    write_if_missing(Path::new("pipelines/topic.toml"), topic::BUILTIN_DEFINITION)?;
    write_if_missing(Path::new("pipelines/quiz.toml"), quiz::BUILTIN_DEFINITION)?;

    println!("\nNext steps:");
    println!("  1. Edit the pipeline definitions under pipelines/");
    println!("  2. Run: skillfuzz validate --pipeline pipelines/quiz.toml --variant quiz");
    println!("  3. Run: skillfuzz serve");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# skillfuzz configuration

parallelism = 4

[server]
host = "127.0.0.1"
port = 8000
cors_permissive = true

[pipelines]
topic = "pipelines/topic.toml"
quiz = "pipelines/quiz.toml"
"#;
