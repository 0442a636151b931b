//! Centroid defuzzification over a discretized output universe.

use crate::error::{FuzzyError, Result};
use crate::variable::LinguisticVariable;

/// Reduce an aggregated fuzzy set to one crisp value.
///
/// `aggregated[i]` is the degree at the i-th sample point of the variable's
/// universe. The result is `sum(x * mu(x)) / sum(mu(x))`; a set with no mass
/// fails with [`FuzzyError::DegenerateAggregate`] instead of producing NaN.
pub fn centroid(variable: &LinguisticVariable, aggregated: &[f64]) -> Result<f64> {
    let points = variable.universe().points();
    if points.len() != aggregated.len() {
        return Err(FuzzyError::InvalidDefinition(format!(
            "aggregate for '{}' has {} samples, universe has {}",
            variable.name(),
            aggregated.len(),
            points.len()
        )));
    }

    let (moment, mass) = points
        .iter()
        .zip(aggregated)
        .fold((0.0, 0.0), |(moment, mass), (&x, &mu)| (moment + x * mu, mass + mu));

    if mass <= 0.0 {
        return Err(FuzzyError::DegenerateAggregate(variable.name().to_string()));
    }
    Ok(moment / mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{MembershipFunction, Universe};
    use crate::variable::{Label, Role};

    fn output() -> LinguisticVariable {
        LinguisticVariable::new(
            "out",
            Role::Consequent,
            Universe::new(0.0, 10.0, 1.0).unwrap(),
            vec![Label {
                name: "all".into(),
                function: MembershipFunction::triangular(0.0, 5.0, 10.0).unwrap(),
            }],
        )
        .unwrap()
    }

    #[test]
    fn symmetric_set_centers_on_peak() {
        let v = output();
        let agg: Vec<f64> = v
            .universe()
            .points()
            .iter()
            .map(|&x| v.membership("all", x).unwrap())
            .collect();
        assert!((centroid(&v, &agg).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn single_spike_returns_its_position() {
        let v = output();
        let mut agg = vec![0.0; 11];
        agg[7] = 0.3;
        assert!((centroid(&v, &agg).unwrap() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_mean_of_two_points() {
        let v = output();
        let mut agg = vec![0.0; 11];
        agg[2] = 1.0;
        agg[8] = 0.5;
        // (2*1 + 8*0.5) / 1.5 = 4
        assert!((centroid(&v, &agg).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_mass_is_degenerate() {
        let v = output();
        let err = centroid(&v, &[0.0; 11]).unwrap_err();
        assert_eq!(err, FuzzyError::DegenerateAggregate("out".into()));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let v = output();
        assert!(matches!(
            centroid(&v, &[1.0; 3]),
            Err(FuzzyError::InvalidDefinition(_))
        ));
    }
}
