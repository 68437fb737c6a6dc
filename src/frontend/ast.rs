//! # Abstract Syntax Tree
//!
//! Syntax tree for probability query notation.
//!
//! A query `P(+B, -E | +A)` has an event conjunction and an optional evidence
//! conjunction. Each literal names a variable and a state, either by sign
//! (`+X` for the true state, `-X` for the false state of a binary variable)
//! or explicitly (`X=label`, where `label` is a state label or a state index).
//!
//! Names are not resolved here; see [`crate::frontend::validate`].

/// A parsed, unresolved query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAst {
    /// Literals before the bar, in source order
    pub event: Vec<LiteralAst>,
    /// Literals after the bar, in source order (empty if no bar)
    pub evidence: Vec<LiteralAst>,
}

/// `variable = state` as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralAst {
    pub variable: String,
    pub value: StateRef,
}

/// How a literal names its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRef {
    /// `+X`
    Positive,
    /// `-X`
    Negative,
    /// `X=label`
    Named(String),
}
