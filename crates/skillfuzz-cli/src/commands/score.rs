//! The `skillfuzz score` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};
use skillfuzz_core::batch::{load_inputs, BatchScorer};
use skillfuzz_core::pipeline::{Pipeline, Variant};
use skillfuzz_core::report::ScoreReport;
use skillfuzz_server::load_config_from;

pub async fn execute(
    input: PathBuf,
    variant: Variant,
    pipeline: Option<PathBuf>,
    output: Option<PathBuf>,
    parallelism: Option<usize>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config.as_deref())?;

    let configured = match variant {
        Variant::Topic => config.pipelines.topic.clone(),
        Variant::Quiz => config.pipelines.quiz.clone(),
    };
    let pipeline = match pipeline.or(configured) {
        Some(path) => {
            tracing::debug!("loading {variant} pipeline from {}", path.display());
            Pipeline::load(variant, &path)?
        }
        None => Pipeline::builtin(variant)?,
    };

    let inputs = load_inputs(&input)?;
    if inputs.is_empty() {
        anyhow::bail!("no request files found in {}", input.display());
    }

    let scorer = BatchScorer::new(Arc::new(pipeline), parallelism.unwrap_or(config.parallelism));
    let report = scorer.run(inputs).await?;

    print_report(&report);

    if let Some(output) = output {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = output.join(format!("score-{variant}-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    let failed = report.failed();
    if failed > 0 {
        anyhow::bail!("{failed} of {} request(s) could not be scored", report.results.len());
    }
    Ok(())
}

fn print_report(report: &ScoreReport) {
    let mut table = Table::new();
    table.set_header(vec![
        "Request", "Topic", "Raw", "Penalty", "Fuzzy", "Adjusted", "Level",
    ]);

    for result in &report.results {
        match &result.assessment {
            Some(assessment) => {
                for (topic, t) in &assessment.topics {
                    table.add_row(vec![
                        Cell::new(&result.source),
                        Cell::new(topic),
                        Cell::new(format!("{:.0}", t.raw_score)),
                        Cell::new(format!("{:.2}", t.penalty)),
                        Cell::new(format!("{:.2}", t.fuzzy_score)),
                        Cell::new(format!("{:.2}", t.adjusted_score)),
                        Cell::new(t.level),
                    ]);
                }
            }
            None => {
                table.add_row(vec![
                    Cell::new(&result.source),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("ERROR"),
                ]);
            }
        }
    }

    println!("{table}");

    for result in &report.results {
        match (&result.assessment, &result.error) {
            (Some(assessment), _) => println!("{}: overall {}", result.source, assessment.overall),
            (None, Some(error)) => println!("{}: error: {error}", result.source),
            (None, None) => {}
        }
    }
}
