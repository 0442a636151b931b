//! skillfuzz-core — Fuzzy inference engine and skill-level scoring.
//!
//! Triangular membership functions over discretized universes, boolean rule
//! evaluation, Mamdani aggregation and centroid defuzzification, plus the two
//! scoring pipelines that turn quiz telemetry into Beginner / Intermediate /
//! Advanced levels.

pub mod batch;
pub mod defuzz;
pub mod error;
pub mod level;
pub mod membership;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod rule;
pub mod system;
pub mod variable;

pub use error::{FuzzyError, Result};
pub use level::{overall_level, LevelThresholds, SkillLevel};
pub use pipeline::{Assessment, Pipeline, QuizPipeline, TopicAssessment, TopicPipeline, Variant};
pub use system::{ControlSystem, CrispValues, Evaluation};
