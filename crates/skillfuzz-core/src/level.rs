//! Discrete skill levels, score classification and cross-topic aggregation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, Result};

/// Categorical skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Ordinal used when averaging levels: 1, 2 or 3.
    pub fn ordinal(self) -> u8 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Beginner => write!(f, "Beginner"),
            SkillLevel::Intermediate => write!(f, "Intermediate"),
            SkillLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            other => Err(format!("unknown skill level: {other}")),
        }
    }
}

/// Lower bounds of the two upper levels; anything below `intermediate` is
/// `Beginner`. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub advanced: f64,
    pub intermediate: f64,
}

impl LevelThresholds {
    pub fn new(advanced: f64, intermediate: f64) -> Self {
        Self {
            advanced,
            intermediate,
        }
    }

    pub fn classify(&self, value: f64) -> SkillLevel {
        if value >= self.advanced {
            SkillLevel::Advanced
        } else if value >= self.intermediate {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        }
    }

    /// Reject thresholds that are non-finite or out of order.
    pub fn check(&self, what: &str) -> Result<()> {
        if !(self.advanced.is_finite() && self.intermediate.is_finite())
            || self.intermediate > self.advanced
        {
            return Err(FuzzyError::InvalidDefinition(format!(
                "{what} thresholds must be finite with intermediate <= advanced, got {} / {}",
                self.intermediate, self.advanced
            )));
        }
        Ok(())
    }
}

/// Average the ordinals of per-topic levels and classify the mean.
///
/// Fails with [`FuzzyError::NoTopics`] when there is nothing to average.
pub fn overall_level<I>(levels: I, thresholds: &LevelThresholds) -> Result<SkillLevel>
where
    I: IntoIterator<Item = SkillLevel>,
{
    let (sum, count) = levels
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), level| {
            (sum + u32::from(level.ordinal()), count + 1)
        });
    if count == 0 {
        return Err(FuzzyError::NoTopics);
    }
    let average = f64::from(sum) / f64::from(count);
    Ok(thresholds.classify(average))
}
