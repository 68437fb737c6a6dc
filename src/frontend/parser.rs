//! # Query Parser
//!
//! Parses probability query notation into a [`QueryAst`] using the pest grammar
//! in `grammar/query.pest`. No names are resolved at this stage.

use crate::engine::errors::InferenceError;
use crate::frontend::ast::*;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar/query.pest"]
pub struct QueryParser;

/// Parses query text such as `P(+B, -E | +A)`.
///
/// # Returns
///
/// * `Ok(QueryAst)` - Successfully parsed query
/// * `Err(InferenceError::ParseError)` - Syntax error with location information
///
/// # Example
///
/// ```rust
/// use baynet::frontend::parser::parse_query;
/// use baynet::ast::StateRef;
///
/// let ast = parse_query("P(+B, -E | +A)").unwrap();
/// assert_eq!(ast.event.len(), 2);
/// assert_eq!(ast.evidence[0].variable, "A");
/// assert_eq!(ast.evidence[0].value, StateRef::Positive);
/// ```
pub fn parse_query(source: &str) -> Result<QueryAst, InferenceError> {
    let mut pairs = QueryParser::parse(Rule::query, source)
        .map_err(|e| InferenceError::ParseError(e.to_string()))?;

    let mut event = Vec::new();
    let mut evidence = Vec::new();

    if let Some(query_pair) = pairs.next() {
        debug_assert_eq!(query_pair.as_rule(), Rule::query);
        for inner in query_pair.into_inner() {
            match inner.as_rule() {
                Rule::event => event = build_conjunction(inner)?,
                Rule::evidence => evidence = build_conjunction(inner)?,
                _ => {}
            }
        }
    }

    if event.is_empty() {
        return Err(InferenceError::ParseError(format!(
            "query '{}' has no event",
            source.trim()
        )));
    }
    Ok(QueryAst { event, evidence })
}

fn build_conjunction(pair: pest::iterators::Pair<Rule>) -> Result<Vec<LiteralAst>, InferenceError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::literal)
        .map(build_literal)
        .collect()
}

fn build_literal(pair: pest::iterators::Pair<Rule>) -> Result<LiteralAst, InferenceError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| InferenceError::ParseError("empty literal".into()))?;
    match inner.as_rule() {
        Rule::signed => {
            let mut value = None;
            let mut variable = None;
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::positive => value = Some(StateRef::Positive),
                    Rule::negative => value = Some(StateRef::Negative),
                    Rule::ident => variable = Some(p.as_str().to_string()),
                    _ => {}
                }
            }
            match (variable, value) {
                (Some(variable), Some(value)) => Ok(LiteralAst { variable, value }),
                _ => Err(InferenceError::ParseError("malformed signed literal".into())),
            }
        }
        Rule::named => {
            let mut parts = inner.into_inner();
            let variable = parts.next().map(|p| p.as_str().to_string());
            let state = parts.next().map(|p| p.as_str().to_string());
            match (variable, state) {
                (Some(variable), Some(state)) => Ok(LiteralAst {
                    variable,
                    value: StateRef::Named(state),
                }),
                _ => Err(InferenceError::ParseError("malformed named literal".into())),
            }
        }
        other => Err(InferenceError::ParseError(format!(
            "unexpected rule {:?} in literal",
            other
        ))),
    }
}
