//! Quiz-wide pipeline: per-topic raw score plus totals shared by every topic.
//!
//! Mistakes are not measured here. Each topic's histogram is derived from the
//! points it is missing, the penalty is scaled by the total-score bracket,
//! and the defuzzified score is shifted by a second bracket table before it
//! is classified.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{
    check_finite, check_max_score, check_score, require_variables, Assessment, Bracket, DifficultyWeights, TopicAssessment,
    ADJUSTED_SCORE, RAW_SCORE,
};
use crate::error::{FuzzyError, Result};
use crate::level::{overall_level, LevelThresholds};
use crate::model::{Difficulty, MistakeHistogram, QuizEvaluationRequest, QuizEvaluationResponse};
use crate::parser::{parse_pipeline, parse_pipeline_str, PipelineDefinition};
use crate::system::ControlSystem;

pub const TOTAL_SCORE: &str = "total_score";
pub const TOTAL_TIME: &str = "total_time";

/// Definition compiled into the crate.
pub const BUILTIN_DEFINITION: &str = include_str!("../../pipelines/quiz.toml");

/// Quiz-wide inputs shared by every topic of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizTotals {
    pub total_score: f64,
    pub total_time: f64,
}

/// Up to `max_count` missing chunks of `points` are attributed to
/// `difficulty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MistakeBucket {
    pub difficulty: Difficulty,
    pub points: f64,
    pub max_count: u32,
}

/// Flat penalty for weak topics on slow quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowPenalty {
    /// Applies when the total time is strictly greater than this.
    pub time_above: f64,
    /// Applies when the topic score is strictly less than this.
    pub score_below: f64,
    pub amount: f64,
}

/// Numeric parameters of the quiz-wide pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizScoring {
    pub max_topic_score: f64,
    pub penalty_cap: f64,
    pub difficulty_weights: DifficultyWeights,
    pub levels: LevelThresholds,
    pub overall: LevelThresholds,
    /// Filled in order, largest first.
    pub buckets: Vec<MistakeBucket>,
    /// Multiplier on the weighted mistakes, by total score.
    pub penalty_scaling: Vec<Bracket>,
    pub slow_penalty: Option<SlowPenalty>,
    /// Offset added to the final score, by total score.
    pub adjustments: Vec<Bracket>,
}

impl Default for QuizScoring {
    fn default() -> Self {
        Self {
            max_topic_score: 70.0,
            penalty_cap: 5.0,
            difficulty_weights: DifficultyWeights {
                easy: 0.4,
                medium: 0.8,
                hard: 1.5,
            },
            levels: LevelThresholds::new(50.0, 25.0),
            overall: LevelThresholds::new(2.5, 1.5),
            buckets: vec![
                MistakeBucket {
                    difficulty: Difficulty::Hard,
                    points: 20.0,
                    max_count: 2,
                },
                MistakeBucket {
                    difficulty: Difficulty::Medium,
                    points: 10.0,
                    max_count: 2,
                },
                MistakeBucket {
                    difficulty: Difficulty::Easy,
                    points: 5.0,
                    max_count: 2,
                },
            ],
            penalty_scaling: vec![Bracket::at_least(250.0, 0.3), Bracket::at_least(200.0, 0.5)],
            slow_penalty: Some(SlowPenalty {
                time_above: 6000.0,
                score_below: 25.0,
                amount: 1.0,
            }),
            adjustments: vec![
                Bracket::at_least(250.0, 5.0),
                Bracket::at_least(200.0, 3.0),
                Bracket::below(150.0, -3.0),
            ],
        }
    }
}

impl QuizScoring {
    /// Derive a mistake histogram from the points a topic is missing.
    ///
    /// Buckets are filled greedily in order; whatever deficit is left once
    /// every bucket is capped or too large is dropped.
    pub fn wrong_questions(&self, score: f64) -> MistakeHistogram {
        let mut deficit = (self.max_topic_score - score).max(0.0);
        let mut histogram = MistakeHistogram::default();
        for bucket in &self.buckets {
            if bucket.points <= 0.0 {
                continue;
            }
            let fits = (deficit / bucket.points).floor() as u32;
            for _ in 0..fits.min(bucket.max_count) {
                histogram.add(bucket.difficulty);
                deficit -= bucket.points;
            }
        }
        histogram
    }

    /// Weighted mistakes scaled by the total-score bracket, plus the slow
    /// penalty, clamped to `[0, penalty_cap]`. Zero without mistakes.
    pub fn penalty(&self, mistakes: &MistakeHistogram, totals: QuizTotals, score: f64) -> f64 {
        if mistakes.is_empty() {
            return 0.0;
        }
        let mut penalty = self.difficulty_weights.weighted_sum(mistakes);
        if let Some(scale) = Bracket::first_match(&self.penalty_scaling, totals.total_score) {
            penalty *= scale;
        }
        if let Some(slow) = &self.slow_penalty {
            if totals.total_time > slow.time_above && score < slow.score_below {
                penalty += slow.amount;
            }
        }
        penalty.clamp(0.0, self.penalty_cap)
    }

    /// Apply the total-score adjustment and clamp to `[0, max_topic_score]`.
    pub fn adjust(&self, score: f64, total_score: f64) -> f64 {
        let offset = Bracket::first_match(&self.adjustments, total_score).unwrap_or(0.0);
        (score + offset).clamp(0.0, self.max_topic_score)
    }
}

/// Scores topics with a `raw_score` / `total_score` / `total_time` system.
#[derive(Debug, Clone)]
pub struct QuizPipeline {
    system: ControlSystem,
    scoring: QuizScoring,
}

impl QuizPipeline {
    pub fn new(system: ControlSystem, scoring: QuizScoring) -> Result<Self> {
        require_variables(&system, &[RAW_SCORE, TOTAL_SCORE, TOTAL_TIME], ADJUSTED_SCORE)?;
        scoring.levels.check("level")?;
        scoring.overall.check("overall level")?;
        check_max_score(&system, "max_topic_score", scoring.max_topic_score)?;
        scoring.difficulty_weights.check()?;
        if let Some(bucket) = scoring
            .buckets
            .iter()
            .find(|b| !(b.points.is_finite() && b.points > 0.0))
        {
            return Err(FuzzyError::InvalidDefinition(format!(
                "{} bucket points must be positive, got {}",
                bucket.difficulty, bucket.points
            )));
        }
        for bracket in scoring.penalty_scaling.iter().chain(&scoring.adjustments) {
            check_finite("bracket value", bracket.value)?;
        }
        if let Some(slow) = &scoring.slow_penalty {
            check_finite("slow_penalty.amount", slow.amount)?;
        }
        if !(scoring.penalty_cap.is_finite() && scoring.penalty_cap >= 0.0) {
            return Err(FuzzyError::InvalidDefinition(format!(
                "penalty_cap must be non-negative, got {}",
                scoring.penalty_cap
            )));
        }
        Ok(Self { system, scoring })
    }

    pub fn from_definition(def: PipelineDefinition<QuizScoring>) -> Result<Self> {
        Self::new(def.system.build()?, def.scoring)
    }

    /// The pipeline shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        let def = parse_pipeline_str(BUILTIN_DEFINITION, Path::new("pipelines/quiz.toml"))?;
        Ok(Self::from_definition(def)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let def = parse_pipeline(path)?;
        Self::from_definition(def)
            .with_context(|| format!("invalid quiz pipeline: {}", path.display()))
    }

    pub fn system(&self) -> &ControlSystem {
        &self.system
    }

    pub fn scoring(&self) -> &QuizScoring {
        &self.scoring
    }

    /// Score a single topic against the quiz totals.
    pub fn assess_topic(&self, topic: &str, score: f64, totals: QuizTotals) -> Result<TopicAssessment> {
        check_score(topic, score, self.scoring.max_topic_score)?;

        let mistakes = self.scoring.wrong_questions(score);
        let penalty = self.scoring.penalty(&mistakes, totals, score);

        let mut evaluation = self.system.evaluation();
        evaluation
            .input(RAW_SCORE, score)
            .input(TOTAL_SCORE, totals.total_score)
            .input(TOTAL_TIME, totals.total_time);
        evaluation.compute()?;
        let fuzzy_score = evaluation
            .output(ADJUSTED_SCORE)
            .ok_or_else(|| FuzzyError::UnknownVariable(ADJUSTED_SCORE.to_string()))?;

        let adjusted_score = self.scoring.adjust(fuzzy_score - penalty, totals.total_score);
        let level = self.scoring.levels.classify(adjusted_score);

        tracing::debug!(topic, score, penalty, fuzzy_score, adjusted_score, %level, "topic assessed");

        Ok(TopicAssessment {
            raw_score: score,
            mistakes,
            penalty,
            fuzzy_score,
            adjusted_score,
            level,
        })
    }

    /// Score every topic and aggregate.
    pub fn assess(&self, scores: &BTreeMap<String, f64>, totals: QuizTotals) -> Result<Assessment> {
        if scores.is_empty() {
            return Err(FuzzyError::NoTopics);
        }
        let topics = scores
            .iter()
            .map(|(topic, &score)| Ok((topic.clone(), self.assess_topic(topic, score, totals)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let overall = overall_level(topics.values().map(|t| t.level), &self.scoring.overall)?;
        Ok(Assessment { topics, overall })
    }

    /// Full quiz evaluation request.
    pub fn handle(&self, request: &QuizEvaluationRequest) -> Result<QuizEvaluationResponse> {
        let totals = QuizTotals {
            total_score: request.total_score,
            total_time: request.total_time,
        };
        let assessment = self.assess(&request.topic_scores, totals)?;
        Ok(QuizEvaluationResponse {
            level: assessment.overall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::SkillLevel;

    fn totals(total_score: f64, total_time: f64) -> QuizTotals {
        QuizTotals {
            total_score,
            total_time,
        }
    }

    #[test]
    fn builtin_scoring_matches_defaults() {
        let pipeline = QuizPipeline::builtin().unwrap();
        assert_eq!(pipeline.scoring(), &QuizScoring::default());
        assert_eq!(pipeline.system().rules().len(), 14);
    }

    #[test]
    fn wrong_questions_fill_largest_buckets_first() {
        let s = QuizScoring::default();
        assert_eq!(s.wrong_questions(70.0), MistakeHistogram::default());
        assert_eq!(s.wrong_questions(0.0), MistakeHistogram::new(2, 2, 2));
        assert_eq!(s.wrong_questions(60.0), MistakeHistogram::new(0, 1, 0));
        assert_eq!(s.wrong_questions(45.0), MistakeHistogram::new(1, 0, 1));
        // a 3-point deficit fits no bucket
        assert_eq!(s.wrong_questions(67.0), MistakeHistogram::default());
    }

    #[test]
    fn penalty_is_zero_without_mistakes() {
        let s = QuizScoring::default();
        assert_eq!(s.penalty(&MistakeHistogram::default(), totals(0.0, 9000.0), 0.0), 0.0);
    }

    #[test]
    fn penalty_scaling_and_slow_bump() {
        let s = QuizScoring::default();
        let one_medium = MistakeHistogram::new(0, 1, 0);
        assert!((s.penalty(&one_medium, totals(260.0, 500.0), 60.0) - 0.24).abs() < 1e-9);
        assert!((s.penalty(&one_medium, totals(210.0, 500.0), 60.0) - 0.4).abs() < 1e-9);
        assert!((s.penalty(&one_medium, totals(100.0, 500.0), 60.0) - 0.8).abs() < 1e-9);
        assert!((s.penalty(&one_medium, totals(100.0, 6001.0), 20.0) - 1.8).abs() < 1e-9);
        // the time bound is strict
        assert!((s.penalty(&one_medium, totals(100.0, 6000.0), 20.0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn penalty_stays_within_cap() {
        let s = QuizScoring::default();
        let mut histograms: Vec<MistakeHistogram> = (0..=70)
            .step_by(5)
            .map(|score| s.wrong_questions(f64::from(score)))
            .collect();
        histograms.extend([
            MistakeHistogram::new(100, 100, 100),
            MistakeHistogram::new(0, 0, 50),
            MistakeHistogram::new(1000, 0, 0),
        ]);
        for mistakes in &histograms {
            for score in [0.0, 20.0, 70.0] {
                for total_score in [0.0, 149.0, 200.0, 250.0, 350.0] {
                    for total_time in [0.0, 6000.0, 10000.0] {
                        let p = s.penalty(mistakes, totals(total_score, total_time), score);
                        assert!((0.0..=5.0).contains(&p), "penalty {p} for {mistakes:?}");
                    }
                }
            }
        }
        // large histograms hit the cap
        let heavy = MistakeHistogram::new(100, 100, 100);
        assert_eq!(s.penalty(&heavy, totals(300.0, 500.0), 60.0), 5.0);
    }

    #[test]
    fn adjustments_are_clamped() {
        let s = QuizScoring::default();
        assert_eq!(s.adjust(68.0, 300.0), 70.0);
        assert_eq!(s.adjust(40.0, 220.0), 43.0);
        assert_eq!(s.adjust(40.0, 175.0), 40.0);
        assert_eq!(s.adjust(2.0, 100.0), 0.0);
        assert_eq!(s.adjust(-1.0, 175.0), 0.0);
    }

    #[test]
    fn strong_quiz_is_advanced() {
        let pipeline = QuizPipeline::builtin().unwrap();
        let topic = pipeline.assess_topic("algebra", 60.0, totals(260.0, 500.0)).unwrap();
        assert_eq!(topic.mistakes, MistakeHistogram::new(0, 1, 0));
        assert!((topic.penalty - 0.24).abs() < 1e-9);
        assert!((topic.adjusted_score - (topic.fuzzy_score - 0.24 + 5.0)).abs() < 1e-9);
        assert_eq!(topic.level, SkillLevel::Advanced);
    }

    #[test]
    fn no_firing_rule_is_degenerate() {
        let pipeline = QuizPipeline::builtin().unwrap();
        let err = pipeline.assess_topic("algebra", 35.0, totals(0.0, 5000.0)).unwrap_err();
        assert_eq!(err, FuzzyError::DegenerateAggregate("adjusted_score".into()));
    }

    fn rejected(scoring: QuizScoring) -> String {
        let system = QuizPipeline::builtin().unwrap().system().clone();
        match QuizPipeline::new(system, scoring).unwrap_err() {
            FuzzyError::InvalidDefinition(message) => message,
            other => panic!("expected InvalidDefinition, got {other:?}"),
        }
    }

    #[test]
    fn max_topic_score_beyond_universe_is_rejected_at_build_time() {
        let mut scoring = QuizScoring::default();
        scoring.max_topic_score = 100.0;
        assert!(rejected(scoring).contains("exceeds the raw_score universe"));
    }

    #[test]
    fn negative_weight_is_rejected_at_build_time() {
        let mut scoring = QuizScoring::default();
        scoring.difficulty_weights.medium = -0.8;
        assert!(rejected(scoring).contains("medium weight"));
    }

    #[test]
    fn empty_bucket_is_rejected_at_build_time() {
        let mut scoring = QuizScoring::default();
        scoring.buckets[2].points = 0.0;
        assert!(rejected(scoring).contains("easy bucket points"));
    }

    #[test]
    fn non_finite_bracket_is_rejected_at_build_time() {
        let mut scoring = QuizScoring::default();
        scoring.adjustments[0].value = f64::NAN;
        assert!(rejected(scoring).contains("bracket value"));
    }

    #[test]
    fn totals_outside_their_universe_are_rejected() {
        let pipeline = QuizPipeline::builtin().unwrap();
        let err = pipeline.assess_topic("algebra", 60.0, totals(400.0, 500.0)).unwrap_err();
        assert!(matches!(err, FuzzyError::InvalidInput(_)));
    }
}
