//! TOML pipeline definition parser.
//!
//! A pipeline file has a `[system]` table describing the control system and
//! an optional `[scoring]` table with the pipeline's numeric parameters:
//!
//! ```toml
//! [system]
//! name = "topic"
//!
//! [[system.antecedents]]
//! name = "raw_score"
//! min = 0
//! max = 50
//! labels = { low = [0, 0, 20], medium = [10, 25, 40], high = [30, 50, 50] }
//!
//! [[system.rules]]
//! if = { and = ["raw_score.high", "penalty.low"] }
//! then = ["adjusted_score.high"]
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FuzzyError;
use crate::membership::{MembershipFunction, Universe};
use crate::rule::{Condition, Rule, Term};
use crate::system::ControlSystem;
use crate::variable::{Label, LinguisticVariable, Role};

/// A whole pipeline file: the control system plus scoring parameters `P`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDefinition<P> {
    pub system: SystemDefinition,
    #[serde(default)]
    pub scoring: P,
}

/// Declarative description of a control system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDefinition {
    pub name: String,
    #[serde(default)]
    pub antecedents: Vec<VariableDefinition>,
    #[serde(default)]
    pub consequents: Vec<VariableDefinition>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

/// A linguistic variable: bounds plus explicit or automatic labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    /// Triangular labels as `[a, b, c]` breakpoints.
    #[serde(default)]
    pub labels: BTreeMap<String, [f64; 3]>,
    /// Low, middle and high label names for an automatic 3-way partition.
    #[serde(default)]
    pub auto: Option<[String; 3]>,
}

fn default_step() -> f64 {
    1.0
}

/// `if <condition> then <variable.label, ...>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(rename = "if")]
    pub condition: ConditionDefinition,
    pub then: Vec<String>,
}

/// A condition written as `"var.label"`, `{ and = [...] }` or `{ or = [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionDefinition {
    Term(String),
    And { and: Vec<ConditionDefinition> },
    Or { or: Vec<ConditionDefinition> },
}

impl ConditionDefinition {
    fn to_condition(&self) -> Result<Condition, FuzzyError> {
        Ok(match self {
            ConditionDefinition::Term(s) => Condition::Term(Term::parse(s)?),
            ConditionDefinition::And { and } => Condition::And(
                and.iter()
                    .map(Self::to_condition)
                    .collect::<Result<_, _>>()?,
            ),
            ConditionDefinition::Or { or } => Condition::Or(
                or.iter()
                    .map(Self::to_condition)
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl VariableDefinition {
    fn build(&self, role: Role) -> Result<LinguisticVariable, FuzzyError> {
        let universe = Universe::new(self.min, self.max, self.step)?;
        match (&self.auto, self.labels.is_empty()) {
            (Some(names), true) => LinguisticVariable::auto(
                &self.name,
                role,
                universe,
                [names[0].as_str(), names[1].as_str(), names[2].as_str()],
            ),
            (None, false) => {
                let labels = self
                    .labels
                    .iter()
                    .map(|(name, &[a, b, c])| {
                        let function = MembershipFunction::triangular(a, b, c).map_err(|e| {
                            FuzzyError::InvalidMembership {
                                variable: self.name.clone(),
                                label: name.clone(),
                                reason: e.to_string(),
                            }
                        })?;
                        Ok(Label {
                            name: name.clone(),
                            function,
                        })
                    })
                    .collect::<Result<Vec<_>, FuzzyError>>()?;
                LinguisticVariable::new(&self.name, role, universe, labels)
            }
            (Some(_), false) => Err(FuzzyError::InvalidDefinition(format!(
                "variable '{}' sets both 'labels' and 'auto'",
                self.name
            ))),
            (None, true) => Err(FuzzyError::InvalidDefinition(format!(
                "variable '{}' needs either 'labels' or 'auto'",
                self.name
            ))),
        }
    }

    /// Label names this definition will produce.
    fn label_names(&self) -> Vec<String> {
        match &self.auto {
            Some(names) => names.to_vec(),
            None => self.labels.keys().cloned().collect(),
        }
    }
}

impl SystemDefinition {
    /// Build the validated, immutable control system.
    pub fn build(&self) -> Result<ControlSystem, FuzzyError> {
        let antecedents = self
            .antecedents
            .iter()
            .map(|v| v.build(Role::Antecedent))
            .collect::<Result<Vec<_>, _>>()?;
        let consequents = self
            .consequents
            .iter()
            .map(|v| v.build(Role::Consequent))
            .collect::<Result<Vec<_>, _>>()?;
        let rules = self
            .rules
            .iter()
            .map(|r| {
                let consequents = r
                    .then
                    .iter()
                    .map(|t| Term::parse(t))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Rule::new(r.condition.to_condition()?, consequents))
            })
            .collect::<Result<Vec<_>, FuzzyError>>()?;
        ControlSystem::new(&self.name, antecedents, consequents, rules)
    }
}

/// Parse a pipeline file from disk.
pub fn parse_pipeline<P>(path: &Path) -> Result<PipelineDefinition<P>>
where
    P: DeserializeOwned + Default,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pipeline file: {}", path.display()))?;

    parse_pipeline_str(&content, path)
}

/// Parse a pipeline definition from a TOML string.
pub fn parse_pipeline_str<P>(content: &str, source_path: &Path) -> Result<PipelineDefinition<P>>
where
    P: DeserializeOwned + Default,
{
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// A non-fatal finding from definition validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The variable concerned, if any.
    pub variable: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a system definition for suspicious but legal wiring.
///
/// Errors that make the system unusable are reported by
/// [`SystemDefinition::build`]; this only looks for dead labels and
/// repeated rules.
pub fn validate_definition(def: &SystemDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut used_inputs = BTreeSet::new();
    let mut used_outputs = BTreeSet::new();
    let mut seen_rules = HashSet::new();
    for rule in &def.rules {
        if let Ok(condition) = rule.condition.to_condition() {
            for term in condition.terms() {
                used_inputs.insert((term.variable.clone(), term.label.clone()));
            }
            let rendered = format!("{condition} -> {}", rule.then.join(", "));
            if !seen_rules.insert(rendered.clone()) {
                warnings.push(ValidationWarning {
                    variable: None,
                    message: format!("duplicate rule: {rendered}"),
                });
            }
        }
        for then in &rule.then {
            if let Ok(term) = Term::parse(then) {
                used_outputs.insert((term.variable, term.label));
            }
        }
    }

    // Check for antecedent labels no rule reads
    for var in &def.antecedents {
        for label in var.label_names() {
            if !used_inputs.contains(&(var.name.clone(), label.clone())) {
                warnings.push(ValidationWarning {
                    variable: Some(var.name.clone()),
                    message: format!("label '{label}' is never used by any rule"),
                });
            }
        }
    }

    // Check for consequent labels no rule produces
    for var in &def.consequents {
        for label in var.label_names() {
            if !used_outputs.contains(&(var.name.clone(), label.clone())) {
                warnings.push(ValidationWarning {
                    variable: Some(var.name.clone()),
                    message: format!("label '{label}' is never produced by any rule"),
                });
            }
        }
    }

    warnings
}
