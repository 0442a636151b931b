//! Linguistic variables: a named universe with labeled membership functions.

use std::collections::BTreeMap;

use crate::error::{FuzzyError, Result};
use crate::membership::{auto_partition, MembershipFunction, Universe};

/// Whether a variable consumes a crisp input or produces a crisp output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Antecedent,
    Consequent,
}

/// A labeled membership function.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub function: MembershipFunction,
}

/// A named quantity described by overlapping fuzzy categories.
#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticVariable {
    name: String,
    role: Role,
    universe: Universe,
    labels: Vec<Label>,
}

impl LinguisticVariable {
    /// Build a variable from explicit labels.
    ///
    /// Fails if there are no labels, a label name repeats, or a label's
    /// breakpoints leave the universe bounds.
    pub fn new(
        name: impl Into<String>,
        role: Role,
        universe: Universe,
        labels: Vec<Label>,
    ) -> Result<Self> {
        let name = name.into();
        if labels.is_empty() {
            return Err(FuzzyError::InvalidDefinition(format!(
                "variable '{name}' has no labels"
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for label in &labels {
            if !seen.insert(label.name.as_str()) {
                return Err(FuzzyError::InvalidMembership {
                    variable: name.clone(),
                    label: label.name.clone(),
                    reason: "label defined more than once".into(),
                });
            }
            let (lo, hi) = label.function.support();
            if !universe.contains(lo) || !universe.contains(hi) {
                return Err(FuzzyError::InvalidMembership {
                    variable: name.clone(),
                    label: label.name.clone(),
                    reason: format!(
                        "support [{lo}, {hi}] exceeds universe [{}, {}]",
                        universe.min(),
                        universe.max()
                    ),
                });
            }
        }

        Ok(Self {
            name,
            role,
            universe,
            labels,
        })
    }

    /// Build a variable whose three labels are derived from the universe
    /// alone, see [`auto_partition`]. `names` go low to high.
    pub fn auto(
        name: impl Into<String>,
        role: Role,
        universe: Universe,
        names: [&str; 3],
    ) -> Result<Self> {
        let labels = names
            .iter()
            .zip(auto_partition(&universe))
            .map(|(label, function)| Label {
                name: label.to_string(),
                function,
            })
            .collect();
        Self::new(name, role, universe, labels)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Label names in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.name == label)
    }

    /// Look up a label's membership function.
    pub fn function(&self, label: &str) -> Result<&MembershipFunction> {
        self.labels
            .iter()
            .find(|l| l.name == label)
            .map(|l| &l.function)
            .ok_or_else(|| FuzzyError::UnknownLabel {
                variable: self.name.clone(),
                label: label.to_string(),
            })
    }

    /// Degree to which `value` belongs to `label`.
    pub fn membership(&self, label: &str, value: f64) -> Result<f64> {
        Ok(self.function(label)?.degree(value))
    }

    /// Degrees of `value` in every label.
    pub fn fuzzify(&self, value: f64) -> BTreeMap<String, f64> {
        self.labels
            .iter()
            .map(|l| (l.name.clone(), l.function.degree(value)))
            .collect()
    }
}
