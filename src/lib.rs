//! # baynet - Discrete Bayesian Networks
//!
//! baynet answers probability queries over small discrete Bayesian networks
//! two ways and lets the answers be compared:
//!
//! - **exact**: variable elimination with min-fill, min-degree or
//!   lexicographic ordering
//! - **approximate**: forward sampling with rejection on the evidence
//!
//! ## Architecture
//!
//! - **engine**: networks, factors, both inference engines, d-separation
//! - **frontend**: parser and name resolution for `P(+B, -E | +A)` notation
//! - **catalog**: the built-in five-variable network and its standard queries
//! - **report**: exact vs sampled side-by-side report
//!
//! ## Usage
//!
//! ```rust
//! use baynet::catalog::five_variable_network;
//! use baynet::engine::elimination::VariableElimination;
//! use baynet::parse_and_resolve;
//!
//! let net = five_variable_network().unwrap();
//! let query = parse_and_resolve(&net, "P(+D)").unwrap();
//! let ve = VariableElimination::new(&net).unwrap();
//! let p = ve.probability_of(&query.event, &query.evidence).unwrap();
//! assert!((p - 0.32).abs() < 1e-12);
//! ```

#![forbid(unsafe_code)]

pub mod frontend;
pub mod engine;
pub mod catalog;
pub mod report;

// Re-export commonly used types
pub use frontend::ast;
pub use frontend::validate;
pub use engine::errors::{InferenceError, Result};
pub use engine::network::{Cpt, Network, NetworkBuilder, VarId};
pub use engine::query::{LabeledQuery, Query};

/// Parses query notation into an unresolved AST.
///
/// This performs syntactic parsing only; names are not checked. Use
/// [`parse_and_resolve`] to get a [`Query`] for a specific network.
///
/// # Returns
///
/// * `Ok(QueryAst)` - Successfully parsed query
/// * `Err(InferenceError::ParseError)` - Syntax error in the text
///
/// # Example
///
/// ```rust
/// let ast = baynet::parse_query("P(+A | -B)").unwrap();
/// assert_eq!(ast.event[0].variable, "A");
/// ```
pub fn parse_query(source: &str) -> Result<ast::QueryAst> {
    frontend::parser::parse_query(source)
}

/// Parses query notation and resolves it against `network`.
///
/// # Returns
///
/// * `Ok(Query)` - Query with every name and state resolved
/// * `Err(InferenceError)` - Parse error, unknown variable or invalid state
pub fn parse_and_resolve(network: &Network, source: &str) -> Result<Query> {
    let ast = parse_query(source)?;
    validate::resolve_query(network, &ast)
}
