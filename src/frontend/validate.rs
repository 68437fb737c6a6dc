//! # Name Resolution
//!
//! Resolves a parsed [`QueryAst`] against a [`Network`]:
//!
//! - every variable name must exist (`UnknownVariable`)
//! - sign notation (`+X`, `-X`) requires a binary variable
//! - `X=label` accepts a state label or a state index below the domain size
//! - a variable may appear at most once per query
//!
//! The result is a checked [`Query`].

use rustc_hash::FxHashSet;

use crate::engine::errors::InferenceError;
use crate::engine::factor::Assignment;
use crate::engine::network::Network;
use crate::engine::query::Query;
use crate::frontend::ast::*;

/// Resolves a parsed query against `network`.
pub fn resolve_query(network: &Network, ast: &QueryAst) -> Result<Query, InferenceError> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for literal in ast.event.iter().chain(&ast.evidence) {
        if !seen.insert(literal.variable.as_str()) {
            return Err(InferenceError::ValidationError(format!(
                "variable '{}' appears more than once in the query",
                literal.variable
            )));
        }
    }

    let event = resolve_conjunction(network, &ast.event)?;
    let evidence = resolve_conjunction(network, &ast.evidence)?;
    Query::new(network, event, evidence)
}

fn resolve_conjunction(network: &Network, literals: &[LiteralAst]) -> Result<Assignment, InferenceError> {
    let mut out = Assignment::new();
    for literal in literals {
        let id = network.var_id(&literal.variable)?;
        let variable = network.variable(id)?;
        let state = match &literal.value {
            StateRef::Positive | StateRef::Negative if variable.cardinality() != 2 => {
                return Err(InferenceError::ValidationError(format!(
                    "sign notation needs a binary variable, '{}' has {} states",
                    variable.name,
                    variable.cardinality()
                )));
            }
            StateRef::Positive => 1,
            StateRef::Negative => 0,
            StateRef::Named(label) => match variable.state_index(label) {
                Some(index) => index,
                None => match label.parse::<usize>() {
                    Ok(index) if index < variable.cardinality() => index,
                    Ok(index) => {
                        return Err(InferenceError::InconsistentEvidence {
                            variable: variable.name.clone(),
                            value: index,
                            domain_size: variable.cardinality(),
                        })
                    }
                    Err(_) => {
                        return Err(InferenceError::ValidationError(format!(
                            "'{}' has no state '{}'",
                            variable.name, label
                        )))
                    }
                },
            },
        };
        out.insert(id, state);
    }
    Ok(out)
}
