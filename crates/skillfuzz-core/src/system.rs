//! Mamdani control systems.
//!
//! A [`ControlSystem`] is built once from its variables and rules, validated
//! up front, and never mutated afterwards, so it can be shared freely across
//! threads. Each evaluation owns its inputs and outputs: either call
//! [`ControlSystem::compute`] directly or stage inputs on an [`Evaluation`].

use std::collections::{BTreeMap, HashSet};

use crate::defuzz::centroid;
use crate::error::{FuzzyError, Result};
use crate::rule::{Condition, Rule, Term};
use crate::variable::{LinguisticVariable, Role};

/// Crisp values keyed by variable name.
pub type CrispValues = BTreeMap<String, f64>;

/// Immutable rule base bound to its antecedent and consequent variables.
#[derive(Debug, Clone)]
pub struct ControlSystem {
    name: String,
    antecedents: Vec<LinguisticVariable>,
    consequents: Vec<LinguisticVariable>,
    rules: Vec<Rule>,
}

impl ControlSystem {
    /// Build and validate a control system.
    ///
    /// Every term in every rule must name a variable of the right role and a
    /// label that variable defines. Wiring mistakes surface here rather than
    /// during a request.
    pub fn new(
        name: impl Into<String>,
        antecedents: Vec<LinguisticVariable>,
        consequents: Vec<LinguisticVariable>,
        rules: Vec<Rule>,
    ) -> Result<Self> {
        let name = name.into();
        if rules.is_empty() {
            return Err(FuzzyError::EmptyRuleBase);
        }
        if consequents.is_empty() {
            return Err(FuzzyError::InvalidDefinition(format!(
                "control system '{name}' has no consequents"
            )));
        }

        let mut seen = HashSet::new();
        for var in antecedents.iter().chain(&consequents) {
            if !seen.insert(var.name()) {
                return Err(FuzzyError::InvalidDefinition(format!(
                    "variable '{}' is defined more than once",
                    var.name()
                )));
            }
        }
        if let Some(var) = antecedents.iter().find(|v| v.role() != Role::Antecedent) {
            return Err(FuzzyError::InvalidDefinition(format!(
                "'{}' is listed as an antecedent but declared as a consequent",
                var.name()
            )));
        }
        if let Some(var) = consequents.iter().find(|v| v.role() != Role::Consequent) {
            return Err(FuzzyError::InvalidDefinition(format!(
                "'{}' is listed as a consequent but declared as an antecedent",
                var.name()
            )));
        }

        let system = Self {
            name,
            antecedents,
            consequents,
            rules,
        };
        for rule in &system.rules {
            system.check_condition(&rule.condition)?;
            if rule.consequents.is_empty() {
                return Err(FuzzyError::InvalidDefinition(format!(
                    "rule '{}' has no consequent",
                    rule.condition
                )));
            }
            for term in &rule.consequents {
                Self::check_term(system.consequent(&term.variable), term)?;
            }
        }
        Ok(system)
    }

    fn check_condition(&self, condition: &Condition) -> Result<()> {
        match condition {
            Condition::Term(term) => Self::check_term(self.antecedent(&term.variable), term),
            Condition::And(children) | Condition::Or(children) => {
                if children.is_empty() {
                    return Err(FuzzyError::InvalidDefinition(
                        "empty and/or condition".into(),
                    ));
                }
                children.iter().try_for_each(|c| self.check_condition(c))
            }
        }
    }

    fn check_term(variable: Option<&LinguisticVariable>, term: &Term) -> Result<()> {
        let variable = variable.ok_or_else(|| FuzzyError::UnknownVariable(term.variable.clone()))?;
        variable.function(&term.label).map(|_| ())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn antecedents(&self) -> &[LinguisticVariable] {
        &self.antecedents
    }

    pub fn consequents(&self) -> &[LinguisticVariable] {
        &self.consequents
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn antecedent(&self, name: &str) -> Option<&LinguisticVariable> {
        self.antecedents.iter().find(|v| v.name() == name)
    }

    pub fn consequent(&self, name: &str) -> Option<&LinguisticVariable> {
        self.consequents.iter().find(|v| v.name() == name)
    }

    /// Start a fresh, independently owned evaluation.
    pub fn evaluation(&self) -> Evaluation<'_> {
        Evaluation {
            system: self,
            inputs: CrispValues::new(),
            outputs: CrispValues::new(),
        }
    }

    /// Check that every antecedent has a finite input inside its universe.
    fn check_inputs(&self, inputs: &CrispValues) -> Result<()> {
        for var in &self.antecedents {
            let value = *inputs
                .get(var.name())
                .ok_or_else(|| FuzzyError::MissingInput(var.name().to_string()))?;
            let universe = var.universe();
            if !value.is_finite() || !universe.contains(value) {
                return Err(FuzzyError::InvalidInput(format!(
                    "{} = {value} is outside [{}, {}]",
                    var.name(),
                    universe.min(),
                    universe.max()
                )));
            }
        }
        Ok(())
    }

    /// Firing strength of each rule, in rule order.
    pub fn firing_strengths(&self, inputs: &CrispValues) -> Result<Vec<f64>> {
        self.check_inputs(inputs)?;
        let lookup = |name: &str| self.antecedent(name);
        self.rules
            .iter()
            .map(|rule| rule.condition.evaluate(&lookup, inputs))
            .collect()
    }

    /// Aggregated fuzzy set of one consequent, sampled on its universe.
    ///
    /// Each rule targeting the consequent clips its label at the rule's
    /// firing strength; the clipped sets are combined by pointwise maximum.
    pub fn aggregate(&self, consequent: &str, inputs: &CrispValues) -> Result<Vec<f64>> {
        let strengths = self.firing_strengths(inputs)?;
        self.aggregate_with(consequent, &strengths)
    }

    fn aggregate_with(&self, consequent: &str, strengths: &[f64]) -> Result<Vec<f64>> {
        let variable = self
            .consequent(consequent)
            .ok_or_else(|| FuzzyError::UnknownVariable(consequent.to_string()))?;

        let mut aggregated = vec![0.0_f64; variable.universe().len()];
        for (rule, &strength) in self.rules.iter().zip(strengths) {
            if strength <= 0.0 {
                continue;
            }
            for term in rule.consequents.iter().filter(|t| t.variable == consequent) {
                let function = variable.function(&term.label)?;
                for (slot, &x) in aggregated.iter_mut().zip(variable.universe().points()) {
                    *slot = slot.max(strength.min(function.degree(x)));
                }
            }
        }
        Ok(aggregated)
    }

    /// Run inference and defuzzify every consequent.
    pub fn compute(&self, inputs: &CrispValues) -> Result<CrispValues> {
        let strengths = self.firing_strengths(inputs)?;
        let mut outputs = CrispValues::new();
        for variable in &self.consequents {
            let aggregated = self.aggregate_with(variable.name(), &strengths)?;
            outputs.insert(variable.name().to_string(), centroid(variable, &aggregated)?);
        }
        tracing::debug!(system = %self.name, ?inputs, ?outputs, "fuzzy inference complete");
        Ok(outputs)
    }
}

/// Per-call inference state: crisp inputs in, crisp outputs out.
#[derive(Debug, Clone)]
pub struct Evaluation<'a> {
    system: &'a ControlSystem,
    inputs: CrispValues,
    outputs: CrispValues,
}

impl Evaluation<'_> {
    /// Set the crisp value of an antecedent.
    pub fn input(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.inputs.insert(name.into(), value);
        self
    }

    pub fn inputs(&self) -> &CrispValues {
        &self.inputs
    }

    /// Run inference on the staged inputs, replacing any earlier outputs.
    pub fn compute(&mut self) -> Result<&CrispValues> {
        self.outputs = self.system.compute(&self.inputs)?;
        Ok(&self.outputs)
    }

    /// Crisp value of a consequent after [`Evaluation::compute`].
    pub fn output(&self, name: &str) -> Option<f64> {
        self.outputs.get(name).copied()
    }

    pub fn outputs(&self) -> &CrispValues {
        &self.outputs
    }
}
