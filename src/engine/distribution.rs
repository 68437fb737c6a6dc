//! Probability distributions returned by both inference engines.

use crate::engine::errors::{InferenceError, Result};
use crate::engine::factor::{advance, strides, Assignment, Factor};
use crate::engine::network::{Network, VarId};

/// A normalized distribution over an ordered set of target variables.
///
/// Entries are laid out like a [`Factor`]: last variable fastest, state 0
/// (the "false" outcome for binary variables) first. For a single binary
/// variable `values()[0]` is P(false) and `values()[1]` is P(true).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distribution {
    variables: Vec<VarId>,
    names: Vec<String>,
    cardinalities: Vec<usize>,
    values: Vec<f64>,
}

impl Distribution {
    /// Wraps a normalized factor whose scope is already in target order.
    pub fn from_factor(network: &Network, factor: Factor) -> Self {
        let variables = factor.scope().to_vec();
        Self {
            names: variables.iter().map(|&v| network.name(v).to_string()).collect(),
            cardinalities: factor.cardinalities().to_vec(),
            values: factor.values().to_vec(),
            variables,
        }
    }

    /// Builds a distribution from raw (unnormalized) weights in target order.
    ///
    /// Zero total weight means nothing was observed.
    pub fn from_weights(network: &Network, variables: &[VarId], weights: Vec<f64>) -> Result<Self> {
        let cards: Vec<usize> = variables.iter().map(|&v| network.cardinality(v)).collect();
        let factor = Factor::new(variables.to_vec(), cards, weights)?.normalize()?;
        Ok(Self::from_factor(network, factor))
    }

    pub fn variables(&self) -> &[VarId] {
        &self.variables
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    /// Probabilities in layout order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Probability of one full assignment, states given in variable order.
    pub fn probability(&self, states: &[usize]) -> Result<f64> {
        if states.len() != self.variables.len() {
            return Err(InferenceError::ValidationError(format!(
                "expected {} states, got {}",
                self.variables.len(),
                states.len()
            )));
        }
        let strides = strides(&self.cardinalities);
        let mut index = 0;
        for (i, &s) in states.iter().enumerate() {
            if s >= self.cardinalities[i] {
                return Err(InferenceError::InconsistentEvidence {
                    variable: self.names[i].clone(),
                    value: s,
                    domain_size: self.cardinalities[i],
                });
            }
            index += s * strides[i];
        }
        Ok(self.values[index])
    }

    /// Probability of a partial assignment, summing over unmentioned targets.
    ///
    /// Variables in `event` that are not targets of this distribution are an error.
    pub fn probability_of(&self, event: &Assignment) -> Result<f64> {
        for var in event.keys() {
            if !self.variables.contains(var) {
                return Err(InferenceError::ValidationError(format!(
                    "variable #{} is not a target of this distribution",
                    var.0
                )));
            }
        }
        let mut total = 0.0;
        let mut states = vec![0usize; self.variables.len()];
        for &p in &self.values {
            let matches = self
                .variables
                .iter()
                .zip(&states)
                .all(|(v, s)| event.get(v).map_or(true, |e| e == s));
            if matches {
                total += p;
            }
            advance(&mut states, &self.cardinalities);
        }
        Ok(total)
    }

    /// Marginal distribution of one target variable.
    pub fn marginal(&self, var: VarId) -> Result<Vec<f64>> {
        let pos = self
            .variables
            .iter()
            .position(|&v| v == var)
            .ok_or_else(|| {
                InferenceError::ValidationError(format!(
                    "variable #{} is not a target of this distribution",
                    var.0
                ))
            })?;
        let mut out = vec![0.0; self.cardinalities[pos]];
        let mut states = vec![0usize; self.variables.len()];
        for &p in &self.values {
            out[states[pos]] += p;
            advance(&mut states, &self.cardinalities);
        }
        Ok(out)
    }

    /// Iterates `(states, probability)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<usize>, f64)> + '_ {
        let mut states = vec![0usize; self.variables.len()];
        self.values.iter().map(move |&p| {
            let current = states.clone();
            advance(&mut states, &self.cardinalities);
            (current, p)
        })
    }

    /// Largest absolute entry-wise difference to another distribution over the
    /// same variables.
    pub fn max_abs_difference(&self, other: &Distribution) -> Result<f64> {
        if self.variables != other.variables {
            return Err(InferenceError::ValidationError(
                "distributions are over different variables".into(),
            ));
        }
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_binary() -> (Network, VarId, VarId) {
        let mut net = Network::new();
        let a = net.add_variable("A", 2).unwrap();
        let b = net.add_variable("B", 2).unwrap();
        (net, a, b)
    }

    #[test]
    fn from_weights_normalizes() {
        let (net, a, b) = two_binary();
        let d = Distribution::from_weights(&net, &[a, b], vec![1.0, 1.0, 2.0, 4.0]).unwrap();
        assert_eq!(d.values(), &[0.125, 0.125, 0.25, 0.5]);
        assert_eq!(d.names(), &["A".to_string(), "B".to_string()]);
        assert_eq!(d.probability(&[1, 0]).unwrap(), 0.25);
    }

    #[test]
    fn from_weights_with_no_mass_fails() {
        let (net, a, _) = two_binary();
        assert_eq!(
            Distribution::from_weights(&net, &[a], vec![0.0, 0.0]).unwrap_err(),
            InferenceError::ZeroProbabilityEvidence
        );
    }

    #[test]
    fn probability_of_sums_unmentioned_targets() {
        let (net, a, b) = two_binary();
        let d = Distribution::from_weights(&net, &[a, b], vec![1.0, 1.0, 2.0, 4.0]).unwrap();
        let event: Assignment = [(b, 1)].into_iter().collect();
        assert!((d.probability_of(&event).unwrap() - 0.625).abs() < 1e-12);
        assert!((d.probability_of(&Assignment::new()).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn marginal_projects_one_variable() {
        let (net, a, b) = two_binary();
        let d = Distribution::from_weights(&net, &[a, b], vec![1.0, 1.0, 2.0, 4.0]).unwrap();
        assert_eq!(d.marginal(a).unwrap(), vec![0.25, 0.75]);
        assert_eq!(d.marginal(b).unwrap(), vec![0.375, 0.625]);
        assert!(d.marginal(VarId(7)).is_err());
    }

    #[test]
    fn iter_visits_states_in_layout_order() {
        let (net, a, b) = two_binary();
        let d = Distribution::from_weights(&net, &[a, b], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let states: Vec<Vec<usize>> = d.iter().map(|(s, _)| s).collect();
        assert_eq!(states, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }

    #[test]
    fn probability_rejects_bad_states() {
        let (net, a, _) = two_binary();
        let d = Distribution::from_weights(&net, &[a], vec![1.0, 3.0]).unwrap();
        assert!(d.probability(&[0, 0]).is_err());
        assert!(matches!(
            d.probability(&[2]),
            Err(InferenceError::InconsistentEvidence { .. })
        ));
    }
}
