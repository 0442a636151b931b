//! Discretized universes and membership functions.
//!
//! A universe is the sampled numeric domain of a linguistic variable.
//! Membership functions map a crisp value to a degree in `[0, 1]`; the only
//! shape the scoring pipelines use is the triangle.

use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, Result};

/// A strictly increasing, evenly spaced sequence of sample points covering
/// `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    min: f64,
    max: f64,
    step: f64,
    points: Vec<f64>,
}

impl Universe {
    /// Build a universe from `min` to `max` inclusive at a fixed step.
    ///
    /// The last sample is the largest `min + i * step` not exceeding `max`,
    /// so a step that does not divide the range evenly stops short of it.
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(FuzzyError::InvalidUniverse(format!(
                "bounds and step must be finite (min={min}, max={max}, step={step})"
            )));
        }
        if step <= 0.0 {
            return Err(FuzzyError::InvalidUniverse(format!(
                "step must be positive, got {step}"
            )));
        }
        if max - min < step {
            return Err(FuzzyError::InvalidUniverse(format!(
                "[{min}, {max}] at step {step} has fewer than two points"
            )));
        }

        // Tolerate float noise so that e.g. 0..=1 at 0.1 keeps its last point.
        let count = ((max - min) / step + 1e-9).floor() as usize + 1;
        let points = (0..count).map(|i| min + i as f64 * step).collect();

        Ok(Self {
            min,
            max,
            step,
            points,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Midpoint of the declared bounds.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`: construction guarantees at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether `x` lies within the declared bounds.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }
}

/// Degree of membership of `x` in the triangle `a <= b <= c`.
///
/// Zero outside `[a, c]`, one at `b`, linear in between. A degenerate side
/// (`a == b` or `b == c`) turns the triangle into a shoulder, and
/// `a == b == c` is a spike that is one only at that point.
pub fn triangular(x: f64, a: f64, b: f64, c: f64) -> f64 {
    if x < a || x > c {
        return 0.0;
    }
    if x == b {
        return 1.0;
    }
    // x < b implies a < b, and x > b implies b < c, so neither side divides by zero.
    let degree = if x < b {
        (x - a) / (b - a)
    } else {
        (c - x) / (c - b)
    };
    degree.clamp(0.0, 1.0)
}

/// A membership function over a linguistic variable's universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum MembershipFunction {
    /// Triangle with feet at `a` and `c` and peak at `b`.
    Triangular { a: f64, b: f64, c: f64 },
}

impl MembershipFunction {
    /// Triangle from three breakpoints, checking `a <= b <= c`.
    pub fn triangular(a: f64, b: f64, c: f64) -> Result<Self> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return Err(FuzzyError::InvalidDefinition(format!(
                "breakpoints must be finite, got [{a}, {b}, {c}]"
            )));
        }
        if a > b || b > c {
            return Err(FuzzyError::InvalidDefinition(format!(
                "breakpoints must satisfy a <= b <= c, got [{a}, {b}, {c}]"
            )));
        }
        Ok(MembershipFunction::Triangular { a, b, c })
    }

    /// Evaluate the degree of membership at `x`.
    pub fn degree(&self, x: f64) -> f64 {
        match *self {
            MembershipFunction::Triangular { a, b, c } => triangular(x, a, b, c),
        }
    }

    /// The interval outside of which the degree is zero.
    pub fn support(&self) -> (f64, f64) {
        match *self {
            MembershipFunction::Triangular { a, c, .. } => (a, c),
        }
    }

    /// Where the degree is one.
    pub fn peak(&self) -> f64 {
        match *self {
            MembershipFunction::Triangular { b, .. } => b,
        }
    }
}

/// Partition a universe into three overlapping triangles.
///
/// The first label peaks at the minimum and falls to zero at the midpoint,
/// the middle label rises from the minimum to a peak at the midpoint and
/// falls to zero at the maximum, and the last label rises from the midpoint
/// to a peak at the maximum. Every point of the universe has a total degree
/// of exactly one across the three labels.
pub fn auto_partition(universe: &Universe) -> [MembershipFunction; 3] {
    let (lo, mid, hi) = (universe.min(), universe.midpoint(), universe.max());
    [
        MembershipFunction::Triangular { a: lo, b: lo, c: mid },
        MembershipFunction::Triangular { a: lo, b: mid, c: hi },
        MembershipFunction::Triangular { a: mid, b: hi, c: hi },
    ]
}
