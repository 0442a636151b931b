//! Scoring pipelines built on the fuzzy engine.
//!
//! Both pipelines turn quiz telemetry into crisp antecedent inputs, run a
//! [`ControlSystem`](crate::system::ControlSystem), post-adjust the crisp
//! output, classify it into a [`SkillLevel`] and aggregate topics into an
//! overall level. They differ only in their definitions and parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, Result};
use crate::level::SkillLevel;
use crate::model::{Difficulty, MistakeHistogram, QuizEvaluationRequest, TopicLevelsRequest};
use crate::system::ControlSystem;
use crate::variable::Role;

pub mod quiz;
pub mod topic;

pub use quiz::{QuizPipeline, QuizScoring, QuizTotals};
pub use topic::{TopicPipeline, TopicScoring};

/// Antecedent fed with the topic's raw score.
pub const RAW_SCORE: &str = "raw_score";
/// Consequent holding the fuzzy adjusted score.
pub const ADJUSTED_SCORE: &str = "adjusted_score";

/// Per-difficulty weights applied to a mistake histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyWeights {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl DifficultyWeights {
    pub fn weight(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Sum of `count * weight` over the three buckets.
    pub fn weighted_sum(&self, mistakes: &MistakeHistogram) -> f64 {
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .map(|d| f64::from(mistakes.count(d)) * self.weight(d))
            .sum()
    }

    /// Every weight must be a finite, non-negative number.
    pub fn check(&self) -> Result<()> {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let weight = self.weight(difficulty);
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(FuzzyError::InvalidDefinition(format!(
                    "{difficulty} weight must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

/// A numeric bracket over a quiz-wide quantity: matches when the value is
/// `>= at_least` (if set) and `< below` (if set).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    #[serde(default)]
    pub at_least: Option<f64>,
    #[serde(default)]
    pub below: Option<f64>,
    pub value: f64,
}

impl Bracket {
    pub fn at_least(bound: f64, value: f64) -> Self {
        Self {
            at_least: Some(bound),
            below: None,
            value,
        }
    }

    pub fn below(bound: f64, value: f64) -> Self {
        Self {
            at_least: None,
            below: Some(bound),
            value,
        }
    }

    pub fn matches(&self, x: f64) -> bool {
        self.at_least.map_or(true, |lo| x >= lo) && self.below.map_or(true, |hi| x < hi)
    }

    /// Value of the first bracket containing `x`.
    pub fn first_match(brackets: &[Bracket], x: f64) -> Option<f64> {
        brackets.iter().find(|b| b.matches(x)).map(|b| b.value)
    }
}

/// Everything computed for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAssessment {
    pub raw_score: f64,
    /// Mistakes, measured or derived from the score.
    pub mistakes: MistakeHistogram,
    pub penalty: f64,
    /// Crisp output of the control system.
    pub fuzzy_score: f64,
    /// Score after the pipeline's deterministic adjustments.
    pub adjusted_score: f64,
    pub level: SkillLevel,
}

/// Per-topic detail plus the aggregated level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub topics: BTreeMap<String, TopicAssessment>,
    pub overall: SkillLevel,
}

impl Assessment {
    pub fn topic_levels(&self) -> BTreeMap<String, SkillLevel> {
        self.topics
            .iter()
            .map(|(topic, a)| (topic.clone(), a.level))
            .collect()
    }
}

/// Which scoring pipeline a request is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Per-topic levels from measured mistakes.
    Topic,
    /// Quiz-wide evaluation from derived mistakes and totals.
    Quiz,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Topic => write!(f, "topic"),
            Variant::Quiz => write!(f, "quiz"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "topic" => Ok(Variant::Topic),
            "quiz" => Ok(Variant::Quiz),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

/// Either pipeline, for callers that pick the variant at runtime.
#[derive(Debug, Clone)]
pub enum Pipeline {
    Topic(TopicPipeline),
    Quiz(QuizPipeline),
}

impl Pipeline {
    pub fn builtin(variant: Variant) -> anyhow::Result<Self> {
        Ok(match variant {
            Variant::Topic => Pipeline::Topic(TopicPipeline::builtin()?),
            Variant::Quiz => Pipeline::Quiz(QuizPipeline::builtin()?),
        })
    }

    pub fn load(variant: Variant, path: &Path) -> anyhow::Result<Self> {
        Ok(match variant {
            Variant::Topic => Pipeline::Topic(TopicPipeline::load(path)?),
            Variant::Quiz => Pipeline::Quiz(QuizPipeline::load(path)?),
        })
    }

    pub fn variant(&self) -> Variant {
        match self {
            Pipeline::Topic(_) => Variant::Topic,
            Pipeline::Quiz(_) => Variant::Quiz,
        }
    }

    pub fn system(&self) -> &ControlSystem {
        match self {
            Pipeline::Topic(p) => p.system(),
            Pipeline::Quiz(p) => p.system(),
        }
    }

    /// Score a JSON request body of this pipeline's request shape.
    pub fn assess_json(&self, body: &str) -> Result<Assessment> {
        let malformed = |e: serde_json::Error| {
            FuzzyError::InvalidInput(format!("malformed {} request: {e}", self.variant()))
        };
        match self {
            Pipeline::Topic(p) => {
                let request: TopicLevelsRequest = serde_json::from_str(body).map_err(malformed)?;
                let scores = request
                    .topic_scores
                    .iter()
                    .map(|(topic, &score)| (topic.clone(), score as f64))
                    .collect();
                p.assess(&scores, &request.histograms()?)
            }
            Pipeline::Quiz(p) => {
                let request: QuizEvaluationRequest =
                    serde_json::from_str(body).map_err(malformed)?;
                let totals = QuizTotals {
                    total_score: request.total_score,
                    total_time: request.total_time,
                };
                p.assess(&request.topic_scores, totals)
            }
        }
    }
}

/// Check that a system exposes the antecedents and consequent a pipeline
/// feeds and reads.
pub(crate) fn require_variables(
    system: &ControlSystem,
    antecedents: &[&str],
    consequent: &str,
) -> Result<()> {
    for name in antecedents {
        if system.antecedent(name).is_none() {
            return Err(FuzzyError::InvalidDefinition(format!(
                "system '{}' has no antecedent '{name}'",
                system.name()
            )));
        }
    }
    match system.consequent(consequent) {
        Some(var) if var.role() == Role::Consequent => Ok(()),
        _ => Err(FuzzyError::InvalidDefinition(format!(
            "system '{}' has no consequent '{consequent}'",
            system.name()
        ))),
    }
}

/// Reject a non-finite scoring parameter.
pub(crate) fn check_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(FuzzyError::InvalidDefinition(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// The accepted score range must be positive and lie inside the `raw_score`
/// universe.
pub(crate) fn check_max_score(system: &ControlSystem, name: &str, max: f64) -> Result<()> {
    if !(max.is_finite() && max > 0.0) {
        return Err(FuzzyError::InvalidDefinition(format!(
            "{name} must be positive, got {max}"
        )));
    }
    if let Some(var) = system.antecedent(RAW_SCORE) {
        let universe_max = var.universe().max();
        if max > universe_max {
            return Err(FuzzyError::InvalidDefinition(format!(
                "{name} = {max} exceeds the {RAW_SCORE} universe maximum {universe_max}"
            )));
        }
    }
    Ok(())
}

/// Reject a non-finite score or one outside `[0, max]`.
pub(crate) fn check_score(topic: &str, score: f64, max: f64) -> Result<()> {
    if !score.is_finite() || !(0.0..=max).contains(&score) {
        return Err(FuzzyError::InvalidInput(format!(
            "topic '{topic}': score {score} is outside [0, {max}]"
        )));
    }
    Ok(())
}
