//! Conjunctive probability queries and their estimation plans.
//!
//! A [`Query`] is `P(event | evidence)` where both sides are conjunctions of
//! `variable = state`. The exact engine answers any query directly. The
//! sampler may answer a compound event either by filtering on the whole event
//! ([`EstimationPlan::Joint`]) or by multiplying one filtered frequency per
//! event variable ([`EstimationPlan::Factored`]); the latter is only chosen when
//! the event variables are pairwise d-separated given the evidence.

use std::fmt;

use crate::engine::dsep::pairwise_d_separated;
use crate::engine::elimination::check_evidence;
use crate::engine::errors::{InferenceError, Result};
use crate::engine::factor::Assignment;
use crate::engine::network::{Network, VarId};

/// `P(event | evidence)` over a specific network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Conjunction whose probability is requested
    pub event: Assignment,
    /// Observed conjunction the event is conditioned on (may be empty)
    pub evidence: Assignment,
}

impl Query {
    /// Builds a query, checking both sides against the network.
    pub fn new(network: &Network, event: Assignment, evidence: Assignment) -> Result<Self> {
        if event.is_empty() {
            return Err(InferenceError::ValidationError(
                "query event must assign at least one variable".into(),
            ));
        }
        check_evidence(network, &event)?;
        check_evidence(network, &evidence)?;
        if let Some(var) = event.keys().find(|v| evidence.contains_key(v)) {
            return Err(InferenceError::ValidationError(format!(
                "'{}' appears in both the event and the evidence",
                network.name(*var)
            )));
        }
        Ok(Self { event, evidence })
    }

    /// Event variables in id order.
    pub fn event_variables(&self) -> Vec<VarId> {
        self.event.keys().copied().collect()
    }

    /// Evidence variables in id order.
    pub fn evidence_variables(&self) -> Vec<VarId> {
        self.evidence.keys().copied().collect()
    }

    /// Renders the query in `P(+B,-E|+A)` notation.
    ///
    /// Binary variables print as `+Name`/`-Name`, others as `Name=state`.
    /// Literals appear in variable-id order, not in the order they were written.
    pub fn label(&self, network: &Network) -> String {
        let render = |a: &Assignment| {
            a.iter()
                .map(|(&v, &s)| literal(network, v, s))
                .collect::<Vec<_>>()
                .join(",")
        };
        if self.evidence.is_empty() {
            format!("P({})", render(&self.event))
        } else {
            format!("P({}|{})", render(&self.event), render(&self.evidence))
        }
    }
}

/// A query together with the text it is displayed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledQuery {
    pub label: String,
    pub query: Query,
}

impl LabeledQuery {
    /// Labels the query with its canonical rendering.
    pub fn canonical(network: &Network, query: Query) -> Self {
        Self {
            label: query.label(network),
            query,
        }
    }
}

fn literal(network: &Network, var: VarId, state: usize) -> String {
    let variable = &network.variables()[var.index()];
    if variable.cardinality() == 2 {
        let sign = if state == 1 { '+' } else { '-' };
        format!("{}{}", sign, variable.name)
    } else {
        let label = variable
            .states
            .get(state)
            .cloned()
            .unwrap_or_else(|| state.to_string());
        format!("{}={}", variable.name, label)
    }
}

/// How the sampler turns samples into an event probability.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EstimationPlan {
    /// Count samples matching evidence and the whole event.
    Joint,
    /// Multiply per-variable conditional frequencies for these variables.
    Factored(Vec<VarId>),
}

impl fmt::Display for EstimationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimationPlan::Joint => f.write_str("joint"),
            EstimationPlan::Factored(vars) => write!(f, "factored({})", vars.len()),
        }
    }
}

/// Chooses the estimation plan for a query.
///
/// Single-variable events are always `Joint`. Compound events are `Factored`
/// only if the event variables are pairwise d-separated given the evidence.
pub fn plan_estimation(network: &Network, query: &Query) -> Result<EstimationPlan> {
    let vars = query.event_variables();
    if vars.len() < 2 {
        return Ok(EstimationPlan::Joint);
    }
    if pairwise_d_separated(network, &vars, &query.evidence_variables())? {
        #[cfg(feature = "tracing")]
        tracing::debug!(query = %query.label(network), "event variables are d-separated, factoring estimate");
        Ok(EstimationPlan::Factored(vars))
    } else {
        Ok(EstimationPlan::Joint)
    }
}
