//! The `skillfuzz validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use skillfuzz_core::parser::{parse_pipeline, validate_definition, SystemDefinition};
use skillfuzz_core::pipeline::{QuizPipeline, QuizScoring, TopicPipeline, TopicScoring, Variant};

pub fn execute(pipeline_path: PathBuf, variant: Variant) -> Result<()> {
    let context = || format!("invalid {variant} pipeline: {}", pipeline_path.display());

    // Build first so structural errors fail the command; warnings come after.
    let system: SystemDefinition = match variant {
        Variant::Topic => {
            let def = parse_pipeline::<TopicScoring>(&pipeline_path)?;
            let system = def.system.clone();
            TopicPipeline::from_definition(def).with_context(context)?;
            system
        }
        Variant::Quiz => {
            let def = parse_pipeline::<QuizScoring>(&pipeline_path)?;
            let system = def.system.clone();
            QuizPipeline::from_definition(def).with_context(context)?;
            system
        }
    };

    println!(
        "Pipeline: {} ({variant}, {} antecedents, {} rules)",
        system.name,
        system.antecedents.len(),
        system.rules.len()
    );

    let warnings = validate_definition(&system);
    for w in &warnings {
        let prefix = w
            .variable
            .as_ref()
            .map(|v| format!("  [{v}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Pipeline valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
