//! Rule conditions and their evaluation into firing strengths.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FuzzyError, Result};
use crate::variable::LinguisticVariable;

/// A `(variable, label)` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    pub variable: String,
    pub label: String,
}

impl Term {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
        }
    }

    /// Parse the `variable.label` notation used in pipeline definitions.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().split_once('.') {
            Some((variable, label)) if !variable.is_empty() && !label.is_empty() => {
                Ok(Self::new(variable, label))
            }
            _ => Err(FuzzyError::InvalidDefinition(format!(
                "expected 'variable.label', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.variable, self.label)
    }
}

/// Boolean expression tree over antecedent terms.
///
/// `And` takes the minimum of its children and `Or` the maximum.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Term(Term),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn term(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Condition::Term(Term::new(variable, label))
    }

    pub fn and(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(children.into_iter().collect())
    }

    /// Every term referenced anywhere in the tree, depth first.
    pub fn terms(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a Term>) {
        match self {
            Condition::Term(term) => out.push(term),
            Condition::And(children) | Condition::Or(children) => {
                for child in children {
                    child.collect_terms(out);
                }
            }
        }
    }

    /// Evaluate the tree against crisp inputs.
    ///
    /// `lookup` resolves a variable name to its definition. Leaves evaluate
    /// the label's membership at the variable's input value.
    pub fn evaluate<'v, F>(&self, lookup: &F, inputs: &BTreeMap<String, f64>) -> Result<f64>
    where
        F: Fn(&str) -> Option<&'v LinguisticVariable>,
    {
        match self {
            Condition::Term(term) => {
                let variable = lookup(&term.variable)
                    .ok_or_else(|| FuzzyError::UnknownVariable(term.variable.clone()))?;
                let value = inputs
                    .get(&term.variable)
                    .copied()
                    .ok_or_else(|| FuzzyError::MissingInput(term.variable.clone()))?;
                variable.membership(&term.label, value)
            }
            Condition::And(children) => Self::fold(children, lookup, inputs, f64::min, "and"),
            Condition::Or(children) => Self::fold(children, lookup, inputs, f64::max, "or"),
        }
    }

    fn fold<'v, F>(
        children: &[Condition],
        lookup: &F,
        inputs: &BTreeMap<String, f64>,
        combine: fn(f64, f64) -> f64,
        op: &str,
    ) -> Result<f64>
    where
        F: Fn(&str) -> Option<&'v LinguisticVariable>,
    {
        let (first, rest) = children
            .split_first()
            .ok_or_else(|| FuzzyError::InvalidDefinition(format!("empty '{op}' condition")))?;
        let mut acc = first.evaluate(lookup, inputs)?;
        for child in rest {
            acc = combine(acc, child.evaluate(lookup, inputs)?);
        }
        Ok(acc)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, sep) = match self {
            Condition::Term(term) => return write!(f, "{term}"),
            Condition::And(children) => (children, " & "),
            Condition::Or(children) => (children, " | "),
        };
        write!(f, "(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, "{sep}")?;
            }
            write!(f, "{child}")?;
        }
        write!(f, ")")
    }
}

/// `if condition then consequent labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub condition: Condition,
    pub consequents: Vec<Term>,
}

impl Rule {
    pub fn new(condition: Condition, consequents: impl IntoIterator<Item = Term>) -> Self {
        Self {
            condition,
            consequents: consequents.into_iter().collect(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if {} then ", self.condition)?;
        for (i, term) in self.consequents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{MembershipFunction, Universe};
    use crate::variable::{Label, Role};

    fn variable(name: &str) -> LinguisticVariable {
        let tri = |label: &str, a, b, c| Label {
            name: label.into(),
            function: MembershipFunction::triangular(a, b, c).unwrap(),
        };
        LinguisticVariable::new(
            name,
            Role::Antecedent,
            Universe::new(0.0, 50.0, 1.0).unwrap(),
            vec![
                tri("low", 0.0, 0.0, 20.0),
                tri("medium", 10.0, 25.0, 40.0),
                tri("high", 30.0, 50.0, 50.0),
            ],
        )
        .unwrap()
    }

    fn fixture() -> (Vec<LinguisticVariable>, BTreeMap<String, f64>) {
        let vars = vec![variable("x"), variable("y")];
        let inputs = BTreeMap::from([("x".to_string(), 35.0), ("y".to_string(), 5.0)]);
        (vars, inputs)
    }

    fn eval(
        cond: &Condition,
        vars: &[LinguisticVariable],
        inputs: &BTreeMap<String, f64>,
    ) -> Result<f64> {
        let lookup = |name: &str| vars.iter().find(|v| v.name() == name);
        cond.evaluate(&lookup, inputs)
    }

    #[test]
    fn term_parse() {
        assert_eq!(Term::parse("raw_score.high").unwrap(), Term::new("raw_score", "high"));
        assert!(Term::parse("raw_score").is_err());
        assert!(Term::parse(".high").is_err());
        assert!(Term::parse("raw_score.").is_err());
    }

    #[test]
    fn and_is_min_or_is_max() {
        let (vars, inputs) = fixture();
        // x=35: medium=1/3, high=0.25; y=5: low=0.75
        let x_med = Condition::term("x", "medium");
        let x_high = Condition::term("x", "high");
        let y_low = Condition::term("y", "low");

        let and = Condition::and([x_high.clone(), y_low]);
        let or = Condition::or([x_med, x_high]);
        assert!((eval(&and, &vars, &inputs).unwrap() - 0.25).abs() < 1e-12);
        assert!((eval(&or, &vars, &inputs).unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn nested_mixed_conditions() {
        let (vars, inputs) = fixture();
        let cond = Condition::or([
            Condition::and([
                Condition::term("x", "low"),
                Condition::or([Condition::term("y", "low"), Condition::term("y", "high")]),
            ]),
            Condition::and([
                Condition::term("x", "high"),
                Condition::and([Condition::term("y", "low"), Condition::term("x", "medium")]),
            ]),
        ]);
        // left branch: min(0, 0.75) = 0; right branch: min(0.25, 0.75, 1/3) = 0.25
        assert!((eval(&cond, &vars, &inputs).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn and_never_exceeds_children_and_stays_in_unit_interval() {
        let vars = vec![variable("x"), variable("y")];
        for x in (0..=50).step_by(5) {
            for y in (0..=50).step_by(5) {
                let inputs =
                    BTreeMap::from([("x".to_string(), x as f64), ("y".to_string(), y as f64)]);
                let a = Condition::term("x", "medium");
                let b = Condition::term("y", "high");
                let da = eval(&a, &vars, &inputs).unwrap();
                let db = eval(&b, &vars, &inputs).unwrap();
                let and = eval(&Condition::and([a.clone(), b.clone()]), &vars, &inputs).unwrap();
                let or = eval(&Condition::or([a, b]), &vars, &inputs).unwrap();
                assert!(and <= da.min(db));
                assert_eq!(or, da.max(db));
                assert!((0.0..=1.0).contains(&and));
                assert!((0.0..=1.0).contains(&or));
            }
        }
    }

    #[test]
    fn missing_input_fails() {
        let (vars, _) = fixture();
        let inputs = BTreeMap::from([("x".to_string(), 10.0)]);
        let cond = Condition::and([Condition::term("x", "low"), Condition::term("y", "low")]);
        assert_eq!(
            eval(&cond, &vars, &inputs).unwrap_err(),
            FuzzyError::MissingInput("y".into())
        );
    }

    #[test]
    fn unknown_variable_fails() {
        let (vars, inputs) = fixture();
        let cond = Condition::term("z", "low");
        assert_eq!(
            eval(&cond, &vars, &inputs).unwrap_err(),
            FuzzyError::UnknownVariable("z".into())
        );
    }

    #[test]
    fn display_reads_like_the_rule() {
        let rule = Rule::new(
            Condition::or([Condition::term("raw_score", "poor"), Condition::term("total_time", "good")]),
            [Term::new("adjusted_score", "low")],
        );
        assert_eq!(
            rule.to_string(),
            "if (raw_score.poor | total_time.good) then adjusted_score.low"
        );
    }
}
