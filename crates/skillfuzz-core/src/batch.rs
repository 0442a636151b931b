//! Concurrent scoring of many request files.
//!
//! Requests are independent, so they are fanned out over blocking tasks with
//! a semaphore bounding how many run at once. Results come back in input
//! order regardless of completion order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::pipeline::Pipeline;
use crate::report::{ScoreReport, ScoredRequest};

/// One request body to score.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub source: String,
    pub body: String,
}

/// Read a request file, or every `*.json` file in a directory sorted by name.
pub fn load_inputs(path: &Path) -> Result<Vec<BatchInput>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("failed to read directory: {}", path.display()))?
        {
            let entry_path = entry?.path();
            if entry_path.extension().is_some_and(|ext| ext == "json") {
                files.push(entry_path);
            } else {
                tracing::warn!("skipping non-JSON file: {}", entry_path.display());
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    files
        .into_iter()
        .map(|file| {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read request file: {}", file.display()))?;
            Ok(BatchInput {
                source: file.display().to_string(),
                body,
            })
        })
        .collect()
}

/// Scores batches of requests against one shared pipeline.
#[derive(Debug, Clone)]
pub struct BatchScorer {
    pipeline: Arc<Pipeline>,
    parallelism: usize,
}

impl BatchScorer {
    pub fn new(pipeline: Arc<Pipeline>, parallelism: usize) -> Self {
        Self {
            pipeline,
            parallelism: parallelism.max(1),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Score every input and collect the results into a report.
    pub async fn run(&self, inputs: Vec<BatchInput>) -> Result<ScoreReport> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let total = inputs.len();

        let mut futures = FuturesUnordered::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let pipeline = self.pipeline.clone();
            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                let scored = tokio::task::spawn_blocking(move || score_one(&pipeline, input))
                    .await
                    .context("scoring task panicked")?;
                Ok::<_, anyhow::Error>((index, scored))
            });
        }

        let mut slots: Vec<Option<ScoredRequest>> = vec![None; total];
        while let Some(result) = futures.next().await {
            let (index, scored) = result?;
            slots[index] = Some(scored);
        }

        let results: Vec<ScoredRequest> = slots.into_iter().flatten().collect();
        let mut report = ScoreReport::new(
            self.pipeline.variant(),
            self.pipeline.system().name(),
            results,
        );
        report.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            requests = total,
            failed = report.failed(),
            duration_ms = report.duration_ms,
            "batch scored"
        );
        Ok(report)
    }
}

fn score_one(pipeline: &Pipeline, input: BatchInput) -> ScoredRequest {
    match pipeline.assess_json(&input.body) {
        Ok(assessment) => ScoredRequest {
            source: input.source,
            assessment: Some(assessment),
            error: None,
            error_kind: None,
        },
        Err(e) => {
            tracing::warn!("failed to score {}: {e}", input.source);
            ScoredRequest {
                source: input.source,
                assessment: None,
                error: Some(e.to_string()),
                error_kind: Some(e.kind().to_string()),
            }
        }
    }
}
