//! Core data model types for skillfuzz.
//!
//! Quiz telemetry as it arrives from callers, the per-topic mistake
//! histogram derived from it, and the request/response shapes of the two
//! scoring endpoints.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, Result};
use crate::level::SkillLevel;

/// Difficulty bucket of a wrongly answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Map a question's point value to its difficulty: 5, 10 or 20.
    pub fn from_points(points: i64) -> Result<Self> {
        match points {
            5 => Ok(Difficulty::Easy),
            10 => Ok(Difficulty::Medium),
            20 => Ok(Difficulty::Hard),
            other => Err(FuzzyError::InvalidInput(format!(
                "question point value must be 5, 10 or 20, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Count of wrong answers per difficulty bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeHistogram {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl MistakeHistogram {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self { easy, medium, hard }
    }

    pub fn total(&self) -> u32 {
        self.easy + self.medium + self.hard
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn count(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    pub fn add(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    /// Bucket a list of wrongly answered questions by point value.
    pub fn from_questions(questions: &[WrongQuestion]) -> Result<Self> {
        let mut histogram = Self::default();
        for question in questions {
            histogram.add(Difficulty::from_points(question.point)?);
        }
        Ok(histogram)
    }
}

/// One wrongly answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongQuestion {
    pub point: i64,
}

/// Request body of the per-topic levels endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLevelsRequest {
    pub user_id: String,
    /// Raw score per topic, 0..=50.
    pub topic_scores: BTreeMap<String, i64>,
    /// Accepted for compatibility; the per-topic pipeline does not use it.
    pub total_time: i64,
    /// Wrong answers per topic. Topics not listed have no mistakes.
    #[serde(default)]
    pub wrong_questions_data: BTreeMap<String, Vec<WrongQuestion>>,
}

impl TopicLevelsRequest {
    /// Per-topic mistake histograms for every scored topic.
    pub fn histograms(&self) -> Result<BTreeMap<String, MistakeHistogram>> {
        self.topic_scores
            .keys()
            .map(|topic| {
                let histogram = match self.wrong_questions_data.get(topic) {
                    Some(questions) => MistakeHistogram::from_questions(questions)?,
                    None => MistakeHistogram::default(),
                };
                Ok((topic.clone(), histogram))
            })
            .collect()
    }
}

/// Response body of the per-topic levels endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicLevelsResponse {
    pub topic_levels: BTreeMap<String, SkillLevel>,
    pub overall_level: SkillLevel,
}

/// Request body of the quiz-wide evaluation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizEvaluationRequest {
    /// Total quiz score, 0..=350.
    pub total_score: f64,
    /// Total time spent on the quiz, 0..=10000.
    pub total_time: f64,
    /// Raw score per topic, 0..=70.
    pub topic_scores: BTreeMap<String, f64>,
}

/// Response body of the quiz-wide evaluation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizEvaluationResponse {
    pub level: SkillLevel,
}
