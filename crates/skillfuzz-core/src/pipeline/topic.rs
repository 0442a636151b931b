//! Per-topic pipeline: raw score plus a measured mistake histogram.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{
    check_finite, check_max_score, check_score, require_variables, Assessment, DifficultyWeights, TopicAssessment,
    ADJUSTED_SCORE, RAW_SCORE,
};
use crate::error::{FuzzyError, Result};
use crate::level::{overall_level, LevelThresholds};
use crate::model::{MistakeHistogram, TopicLevelsRequest, TopicLevelsResponse};
use crate::parser::{parse_pipeline, parse_pipeline_str, PipelineDefinition};
use crate::system::ControlSystem;

/// Antecedent fed with the difficulty-weighted penalty.
pub const PENALTY: &str = "penalty";

/// Definition compiled into the crate.
pub const BUILTIN_DEFINITION: &str = include_str!("../../pipelines/topic.toml");

/// Numeric parameters of the per-topic pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicScoring {
    /// Highest accepted raw score.
    pub max_score: f64,
    pub penalty_exponent: f64,
    /// Raw scores at or above this get their penalty discounted.
    pub discount_from_score: f64,
    pub discount_factor: f64,
    pub difficulty_weights: DifficultyWeights,
    pub levels: LevelThresholds,
    pub overall: LevelThresholds,
}

impl Default for TopicScoring {
    fn default() -> Self {
        Self {
            max_score: 50.0,
            penalty_exponent: 1.5,
            discount_from_score: 35.0,
            discount_factor: 0.75,
            difficulty_weights: DifficultyWeights {
                easy: 1.0,
                medium: 2.0,
                hard: 4.0,
            },
            levels: LevelThresholds::new(35.0, 20.0),
            overall: LevelThresholds::new(2.6, 1.6),
        }
    }
}

impl TopicScoring {
    /// Mean mistake weight raised to the penalty exponent, discounted for
    /// strong scores. Zero when there are no mistakes.
    pub fn penalty(&self, score: f64, mistakes: &MistakeHistogram) -> f64 {
        let count = f64::from(mistakes.total().max(1));
        let mean = self.difficulty_weights.weighted_sum(mistakes) / count;
        let penalty = mean.powf(self.penalty_exponent);
        if score >= self.discount_from_score {
            penalty * self.discount_factor
        } else {
            penalty
        }
    }
}

/// Scores topics with a `raw_score` / `penalty` control system.
#[derive(Debug, Clone)]
pub struct TopicPipeline {
    system: ControlSystem,
    scoring: TopicScoring,
}

impl TopicPipeline {
    pub fn new(system: ControlSystem, scoring: TopicScoring) -> Result<Self> {
        require_variables(&system, &[RAW_SCORE, PENALTY], ADJUSTED_SCORE)?;
        scoring.levels.check("level")?;
        scoring.overall.check("overall level")?;
        check_max_score(&system, "max_score", scoring.max_score)?;
        scoring.difficulty_weights.check()?;
        check_finite("penalty_exponent", scoring.penalty_exponent)?;
        check_finite("discount_from_score", scoring.discount_from_score)?;
        check_finite("discount_factor", scoring.discount_factor)?;
        Ok(Self { system, scoring })
    }

    pub fn from_definition(def: PipelineDefinition<TopicScoring>) -> Result<Self> {
        Self::new(def.system.build()?, def.scoring)
    }

    /// The pipeline shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        let def = parse_pipeline_str(BUILTIN_DEFINITION, Path::new("pipelines/topic.toml"))?;
        Ok(Self::from_definition(def)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let def = parse_pipeline(path)?;
        Self::from_definition(def)
            .with_context(|| format!("invalid topic pipeline: {}", path.display()))
    }

    pub fn system(&self) -> &ControlSystem {
        &self.system
    }

    pub fn scoring(&self) -> &TopicScoring {
        &self.scoring
    }

    /// Score a single topic.
    pub fn assess_topic(
        &self,
        topic: &str,
        score: f64,
        mistakes: MistakeHistogram,
    ) -> Result<TopicAssessment> {
        check_score(topic, score, self.scoring.max_score)?;

        let mut penalty = self.scoring.penalty(score, &mistakes);
        if let Some(var) = self.system.antecedent(PENALTY) {
            let universe = var.universe();
            penalty = penalty.clamp(universe.min(), universe.max());
        }

        let mut evaluation = self.system.evaluation();
        evaluation.input(RAW_SCORE, score).input(PENALTY, penalty);
        evaluation.compute()?;
        let fuzzy_score = evaluation
            .output(ADJUSTED_SCORE)
            .ok_or_else(|| FuzzyError::UnknownVariable(ADJUSTED_SCORE.to_string()))?;
        let level = self.scoring.levels.classify(fuzzy_score);

        tracing::debug!(topic, score, penalty, fuzzy_score, %level, "topic assessed");

        Ok(TopicAssessment {
            raw_score: score,
            mistakes,
            penalty,
            fuzzy_score,
            adjusted_score: fuzzy_score,
            level,
        })
    }

    /// Score every topic and aggregate. Topics missing from `mistakes` are
    /// scored with an empty histogram.
    pub fn assess(
        &self,
        scores: &BTreeMap<String, f64>,
        mistakes: &BTreeMap<String, MistakeHistogram>,
    ) -> Result<Assessment> {
        if scores.is_empty() {
            return Err(FuzzyError::NoTopics);
        }
        let topics = scores
            .iter()
            .map(|(topic, &score)| {
                let histogram = mistakes.get(topic).copied().unwrap_or_default();
                Ok((topic.clone(), self.assess_topic(topic, score, histogram)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        let overall = overall_level(topics.values().map(|t| t.level), &self.scoring.overall)?;
        Ok(Assessment { topics, overall })
    }

    /// Full per-topic levels request.
    pub fn handle(&self, request: &TopicLevelsRequest) -> Result<TopicLevelsResponse> {
        let scores = request
            .topic_scores
            .iter()
            .map(|(topic, &score)| (topic.clone(), score as f64))
            .collect();
        let assessment = self.assess(&scores, &request.histograms()?)?;
        tracing::debug!(user_id = %request.user_id, overall = %assessment.overall, "topic levels computed");
        Ok(TopicLevelsResponse {
            topic_levels: assessment.topic_levels(),
            overall_level: assessment.overall,
        })
    }
}
