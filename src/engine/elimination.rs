//! # Exact Inference by Variable Elimination
//!
//! Computes P(targets | evidence) exactly:
//!
//! 1. Every CPT becomes a factor over `parents ++ [variable]`.
//! 2. Factors are reduced by the evidence.
//! 3. The remaining non-target variables are ordered by an
//!    [`EliminationHeuristic`] (min-fill by default).
//! 4. Each variable in turn: multiply the factors that mention it, sum it out,
//!    put the result back.
//! 5. The leftover factors are multiplied, laid out in target order and
//!    normalized. The normalizer is P(evidence).
//!
//! The computation is pure arithmetic in a fixed order, so identical inputs
//! give bit-identical outputs.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::distribution::Distribution;
use crate::engine::errors::{InferenceError, Result};
use crate::engine::factor::{Assignment, Factor};
use crate::engine::network::{Network, VarId};
use crate::engine::ordering::{elimination_order, EliminationHeuristic, EliminationOrder};

/// Default cap on the number of entries of any intermediate factor (16M).
pub const DEFAULT_MAX_FACTOR_ENTRIES: usize = 1 << 24;

/// Configuration for variable elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EliminationConfig {
    /// Greedy ordering heuristic.
    pub heuristic: EliminationHeuristic,
    /// Largest intermediate factor the engine may build before giving up.
    pub max_factor_entries: usize,
}

impl Default for EliminationConfig {
    fn default() -> Self {
        Self {
            heuristic: EliminationHeuristic::default(),
            max_factor_entries: DEFAULT_MAX_FACTOR_ENTRIES,
        }
    }
}

impl EliminationConfig {
    pub fn validate(self) -> Result<Self> {
        if self.max_factor_entries == 0 {
            return Err(InferenceError::ValidationError(
                "variable elimination: max_factor_entries must be > 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Exact inference engine over a complete network.
#[derive(Debug, Clone)]
pub struct VariableElimination<'a> {
    network: &'a Network,
    config: EliminationConfig,
}

impl<'a> VariableElimination<'a> {
    /// Creates an engine with the default configuration.
    ///
    /// Fails if any variable lacks a CPT.
    pub fn new(network: &'a Network) -> Result<Self> {
        Self::with_config(network, EliminationConfig::default())
    }

    pub fn with_config(network: &'a Network, config: EliminationConfig) -> Result<Self> {
        network.validate_model()?;
        Ok(Self {
            network,
            config: config.validate()?,
        })
    }

    pub fn config(&self) -> EliminationConfig {
        self.config
    }

    /// P(targets | evidence) using the configured ordering heuristic.
    pub fn query(&self, targets: &[VarId], evidence: &Assignment) -> Result<Distribution> {
        self.check_query(targets, evidence)?;
        let factors = self.reduced_factors(evidence)?;
        let to_eliminate = self.hidden_variables(targets, evidence);
        let order = elimination_order(
            self.network,
            factors.iter().map(Factor::scope),
            &to_eliminate,
            self.config.heuristic,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(
            targets = targets.len(),
            evidence = evidence.len(),
            heuristic = %self.config.heuristic,
            induced_width = order.induced_width,
            "variable elimination order chosen"
        );

        self.run(factors, &order.variables, targets)
    }

    /// P(targets | evidence) with a caller-supplied elimination order.
    ///
    /// `order` must contain exactly the variables that are neither targets nor
    /// evidence.
    pub fn query_with_order(
        &self,
        targets: &[VarId],
        evidence: &Assignment,
        order: &[VarId],
    ) -> Result<Distribution> {
        self.check_query(targets, evidence)?;
        let expected = self.hidden_variables(targets, evidence);
        let given: BTreeSet<VarId> = order.iter().copied().collect();
        if given != expected || given.len() != order.len() {
            return Err(InferenceError::ValidationError(
                "elimination order must list every non-target, non-evidence variable exactly once"
                    .into(),
            ));
        }
        let factors = self.reduced_factors(evidence)?;
        self.run(factors, order, targets)
    }

    /// The order [`VariableElimination::query`] would use.
    pub fn elimination_order(
        &self,
        targets: &[VarId],
        evidence: &Assignment,
    ) -> Result<EliminationOrder> {
        self.check_query(targets, evidence)?;
        let factors = self.reduced_factors(evidence)?;
        Ok(elimination_order(
            self.network,
            factors.iter().map(Factor::scope),
            &self.hidden_variables(targets, evidence),
            self.config.heuristic,
        ))
    }

    /// P(event | evidence) for a conjunctive event such as `B=1, E=0`.
    pub fn probability_of(&self, event: &Assignment, evidence: &Assignment) -> Result<f64> {
        if event.is_empty() {
            return Err(InferenceError::ValidationError(
                "event must assign at least one variable".into(),
            ));
        }
        let targets: Vec<VarId> = event.keys().copied().collect();
        self.query(&targets, evidence)?.probability_of(event)
    }

    /// The full joint distribution over all variables in declaration order.
    pub fn joint(&self) -> Result<Distribution> {
        let all: Vec<VarId> = self.network.ids().collect();
        self.query(&all, &Assignment::new())
    }

    fn check_query(&self, targets: &[VarId], evidence: &Assignment) -> Result<()> {
        check_query(self.network, targets, evidence)
    }

    fn reduced_factors(&self, evidence: &Assignment) -> Result<Vec<Factor>> {
        self.network
            .ids()
            .map(|v| Factor::from_cpt(self.network, v)?.reduce(evidence))
            .collect()
    }

    fn hidden_variables(&self, targets: &[VarId], evidence: &Assignment) -> BTreeSet<VarId> {
        self.network
            .ids()
            .filter(|v| !targets.contains(v) && !evidence.contains_key(v))
            .collect()
    }

    fn run(&self, mut factors: Vec<Factor>, order: &[VarId], targets: &[VarId]) -> Result<Distribution> {
        for &var in order {
            let (bucket, rest): (Vec<Factor>, Vec<Factor>) =
                factors.into_iter().partition(|f| f.contains(var));
            factors = rest;
            if bucket.is_empty() {
                continue;
            }
            let product = self.multiply_all(&bucket)?;
            factors.push(product.sum_out(var));
        }

        let joint = self.multiply_all(&factors)?;
        let posterior = joint.reorder(targets)?.normalize()?;
        Ok(Distribution::from_factor(self.network, posterior))
    }

    fn multiply_all(&self, factors: &[Factor]) -> Result<Factor> {
        let mut cards: BTreeMap<VarId, usize> = BTreeMap::new();
        for f in factors {
            for (&v, &c) in f.scope().iter().zip(f.cardinalities()) {
                cards.insert(v, c);
            }
        }
        let entries = cards
            .values()
            .try_fold(1usize, |acc, &c| acc.checked_mul(c))
            .unwrap_or(usize::MAX);
        if entries > self.config.max_factor_entries {
            return Err(InferenceError::ResourceLimit(format!(
                "intermediate factor over {} variables needs {} entries (limit {})",
                cards.len(),
                entries,
                self.config.max_factor_entries
            )));
        }

        Ok(factors
            .iter()
            .fold(Factor::scalar(1.0), |acc, f| acc.product(f)))
    }
}

/// Validates targets and evidence against a network.
///
/// Shared by both engines so they reject the same malformed queries.
pub(crate) fn check_query(network: &Network, targets: &[VarId], evidence: &Assignment) -> Result<()> {
    if targets.is_empty() {
        return Err(InferenceError::ValidationError(
            "query needs at least one target variable".into(),
        ));
    }
    for (i, &t) in targets.iter().enumerate() {
        network.check_id(t)?;
        if targets[..i].contains(&t) {
            return Err(InferenceError::ValidationError(format!(
                "target '{}' listed twice",
                network.name(t)
            )));
        }
        if evidence.contains_key(&t) {
            return Err(InferenceError::ValidationError(format!(
                "'{}' cannot be both a target and evidence",
                network.name(t)
            )));
        }
    }
    check_evidence(network, evidence)
}

pub(crate) fn check_evidence(network: &Network, evidence: &Assignment) -> Result<()> {
    for (&var, &value) in evidence {
        network.check_id(var)?;
        let domain_size = network.cardinality(var);
        if value >= domain_size {
            return Err(InferenceError::InconsistentEvidence {
                variable: network.name(var).to_string(),
                value,
                domain_size,
            });
        }
    }
    Ok(())
}
