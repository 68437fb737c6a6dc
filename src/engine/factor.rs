//! # Factors
//!
//! A factor maps every assignment of its scope to a non-negative real. CPTs,
//! intermediate elimination results and final posteriors are all factors.
//!
//! Values are stored densely, row-major over the scope with the **last** scope
//! variable varying fastest. For scope `[X, Y]` with `card(Y) = 3` the entry for
//! `(x, y)` lives at `x * 3 + y`.
//!
//! Operations follow Koller & Friedman: product (Def. 4.2), reduction (4.2.3)
//! and marginalization (9.3.1).

use std::collections::BTreeMap;

use crate::engine::errors::{InferenceError, Result};
use crate::engine::network::{Network, VarId};

/// A (partial) assignment of states to variables.
pub type Assignment = BTreeMap<VarId, usize>;

/// A table factor over an ordered scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    scope: Vec<VarId>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Factor {
    /// Creates a factor, checking that the table matches the scope.
    pub fn new(scope: Vec<VarId>, cards: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if scope.len() != cards.len() {
            return Err(InferenceError::Internal(format!(
                "factor scope has {} variables but {} cardinalities",
                scope.len(),
                cards.len()
            )));
        }
        for (i, v) in scope.iter().enumerate() {
            if scope[..i].contains(v) {
                return Err(InferenceError::Internal(format!(
                    "variable #{} appears twice in factor scope",
                    v.0
                )));
            }
        }
        let expected: usize = cards.iter().product();
        if values.len() != expected {
            return Err(InferenceError::Internal(format!(
                "factor table has {} entries, scope requires {}",
                values.len(),
                expected
            )));
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(InferenceError::Numerical(
                "factor values must be finite and non-negative".into(),
            ));
        }
        Ok(Self {
            scope,
            cards,
            values,
        })
    }

    /// The factor with empty scope and a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            scope: Vec::new(),
            cards: Vec::new(),
            values: vec![value],
        }
    }

    /// Converts the CPT of `var` into a factor over `parents ++ [var]`.
    pub fn from_cpt(network: &Network, var: VarId) -> Result<Self> {
        let cpt = network.cpt(var).ok_or_else(|| {
            InferenceError::ValidationError(format!(
                "variable '{}' has no CPT attached",
                network.name(var)
            ))
        })?;
        let mut scope = network.parents(var).to_vec();
        scope.push(var);
        let cards: Vec<usize> = scope.iter().map(|&v| network.cardinality(v)).collect();

        let card = network.cardinality(var);
        let mut values = Vec::with_capacity(cpt.cols() * card);
        // var is last in scope, so its state is the fastest-varying index
        for column in 0..cpt.cols() {
            values.extend(cpt.column(column));
        }
        Ok(Self {
            scope,
            cards,
            values,
        })
    }

    pub fn scope(&self) -> &[VarId] {
        &self.scope
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cards
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: even the scalar factor has one entry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.scope.contains(&var)
    }

    /// Sum of all entries.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Value for an assignment covering (at least) this factor's scope.
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        let strides = strides(&self.cards);
        let mut index = 0;
        for (i, var) in self.scope.iter().enumerate() {
            let state = assignment.get(var).copied().ok_or_else(|| {
                InferenceError::Internal(format!(
                    "assignment is missing variable #{} of the factor scope",
                    var.0
                ))
            })?;
            if state >= self.cards[i] {
                return Err(InferenceError::Internal(format!(
                    "state {} out of range for variable #{}",
                    state, var.0
                )));
            }
            index += state * strides[i];
        }
        Ok(self.values[index])
    }

    /// Pointwise product over the union of both scopes.
    ///
    /// The result's scope is `self`'s scope followed by the variables only in `other`.
    pub fn product(&self, other: &Factor) -> Factor {
        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        for (v, &c) in other.scope.iter().zip(&other.cards) {
            if !scope.contains(v) {
                scope.push(*v);
                cards.push(c);
            }
        }

        let other_pos: Vec<usize> = other
            .scope
            .iter()
            .map(|v| position(&scope, *v))
            .collect();
        let self_strides = strides(&self.cards);
        let other_strides = strides(&other.cards);

        let total: usize = cards.iter().product();
        let mut values = Vec::with_capacity(total);
        let mut states = vec![0usize; scope.len()];
        for _ in 0..total {
            let a: usize = (0..self.scope.len())
                .map(|i| states[i] * self_strides[i])
                .sum();
            let b: usize = other_pos
                .iter()
                .zip(&other_strides)
                .map(|(&p, &s)| states[p] * s)
                .sum();
            values.push(self.values[a] * other.values[b]);
            advance(&mut states, &cards);
        }

        Factor {
            scope,
            cards,
            values,
        }
    }

    /// Marginalizes `var` out of the factor. A no-op if `var` is not in scope.
    pub fn sum_out(&self, var: VarId) -> Factor {
        let Some(pos) = self.scope.iter().position(|&v| v == var) else {
            return self.clone();
        };

        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        scope.remove(pos);
        cards.remove(pos);
        let new_strides = strides(&cards);

        let mut values = vec![0.0; cards.iter().product()];
        let mut states = vec![0usize; self.scope.len()];
        for &v in &self.values {
            let index: usize = states
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != pos)
                .map(|(i, &s)| s * new_strides[if i < pos { i } else { i - 1 }])
                .sum();
            values[index] += v;
            advance(&mut states, &self.cards);
        }

        Factor {
            scope,
            cards,
            values,
        }
    }

    /// Fixes the variables named in `evidence` and drops them from the scope.
    ///
    /// Evidence on variables outside the scope is ignored.
    pub fn reduce(&self, evidence: &Assignment) -> Result<Factor> {
        let mut fixed = vec![None; self.scope.len()];
        for (i, var) in self.scope.iter().enumerate() {
            if let Some(&state) = evidence.get(var) {
                if state >= self.cards[i] {
                    return Err(InferenceError::InconsistentEvidence {
                        variable: format!("#{}", var.0),
                        value: state,
                        domain_size: self.cards[i],
                    });
                }
                fixed[i] = Some(state);
            }
        }
        if fixed.iter().all(Option::is_none) {
            return Ok(self.clone());
        }

        let kept: Vec<usize> = (0..self.scope.len()).filter(|&i| fixed[i].is_none()).collect();
        let scope: Vec<VarId> = kept.iter().map(|&i| self.scope[i]).collect();
        let cards: Vec<usize> = kept.iter().map(|&i| self.cards[i]).collect();
        let old_strides = strides(&self.cards);
        let base: usize = fixed
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| s * old_strides[i]))
            .sum();

        let total: usize = cards.iter().product();
        let mut values = Vec::with_capacity(total);
        let mut states = vec![0usize; scope.len()];
        for _ in 0..total {
            let index = base
                + kept
                    .iter()
                    .zip(&states)
                    .map(|(&i, &s)| s * old_strides[i])
                    .sum::<usize>();
            values.push(self.values[index]);
            advance(&mut states, &cards);
        }

        Ok(Factor {
            scope,
            cards,
            values,
        })
    }

    /// Scales entries to sum to one.
    ///
    /// A zero total means the conditioning event is impossible.
    pub fn normalize(&self) -> Result<Factor> {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return Err(InferenceError::ZeroProbabilityEvidence);
        }
        Ok(Factor {
            scope: self.scope.clone(),
            cards: self.cards.clone(),
            values: self.values.iter().map(|v| v / total).collect(),
        })
    }

    /// Permutes the table so its scope matches `order` exactly.
    pub fn reorder(&self, order: &[VarId]) -> Result<Factor> {
        if order.len() != self.scope.len() || order.iter().any(|v| !self.contains(*v)) {
            return Err(InferenceError::Internal(
                "reorder target must be a permutation of the factor scope".into(),
            ));
        }
        if order == self.scope.as_slice() {
            return Ok(self.clone());
        }

        let old_pos: Vec<usize> = order.iter().map(|v| position(&self.scope, *v)).collect();
        let cards: Vec<usize> = old_pos.iter().map(|&p| self.cards[p]).collect();
        let old_strides = strides(&self.cards);

        let mut values = Vec::with_capacity(self.values.len());
        let mut states = vec![0usize; order.len()];
        for _ in 0..self.values.len() {
            let index: usize = old_pos
                .iter()
                .zip(&states)
                .map(|(&p, &s)| s * old_strides[p])
                .sum();
            values.push(self.values[index]);
            advance(&mut states, &cards);
        }

        Ok(Factor {
            scope: order.to_vec(),
            cards,
            values,
        })
    }
}

/// Row-major strides with the last dimension fastest.
pub(crate) fn strides(cards: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; cards.len()];
    for i in (0..cards.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * cards[i + 1];
    }
    strides
}

/// Odometer increment, last position fastest. Wraps to all zeros after the last state.
#[inline]
pub(crate) fn advance(states: &mut [usize], cards: &[usize]) {
    for i in (0..states.len()).rev() {
        states[i] += 1;
        if states[i] < cards[i] {
            return;
        }
        states[i] = 0;
    }
}

fn position(scope: &[VarId], var: VarId) -> usize {
    scope.iter().position(|&v| v == var).unwrap_or(usize::MAX)
}
