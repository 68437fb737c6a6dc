//! Elimination ordering heuristics.
//!
//! Orders are computed greedily on the interaction graph of the factors (two
//! variables are adjacent when some factor mentions both). Eliminating a
//! variable connects all of its remaining neighbours, exactly as the
//! elimination itself will do when it multiplies their factors together.
//!
//! Ties are broken by variable name and then by id, so for a given network,
//! evidence and target set the order is always the same.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::engine::errors::InferenceError;
use crate::engine::network::{Network, VarId};

/// Greedy scoring rule used to pick the next variable to eliminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EliminationHeuristic {
    /// Alphabetical by variable name. Only sensible for tiny networks.
    Lexicographic,
    /// Fewest remaining neighbours first.
    MinDegree,
    /// Fewest fill-in edges first. Production default.
    #[default]
    MinFill,
}

impl fmt::Display for EliminationHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EliminationHeuristic::Lexicographic => "lexicographic",
            EliminationHeuristic::MinDegree => "min-degree",
            EliminationHeuristic::MinFill => "min-fill",
        };
        f.write_str(name)
    }
}

impl FromStr for EliminationHeuristic {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "lexicographic" | "lex" => Ok(EliminationHeuristic::Lexicographic),
            "min-degree" => Ok(EliminationHeuristic::MinDegree),
            "min-fill" => Ok(EliminationHeuristic::MinFill),
            other => Err(InferenceError::ValidationError(format!(
                "unknown elimination heuristic '{}', expected one of: lexicographic, min-degree, min-fill",
                other
            ))),
        }
    }
}

/// An elimination order together with the size of the largest clique it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EliminationOrder {
    /// Variables in the order they will be summed out
    pub variables: Vec<VarId>,
    /// Largest neighbourhood (excluding the variable) seen while eliminating
    pub induced_width: usize,
}

/// Computes an elimination order for `to_eliminate`.
///
/// `scopes` are the scopes of the factors that will be eliminated over
/// (already reduced by evidence). Variables not in `to_eliminate` stay in the
/// graph and still count as neighbours.
pub fn elimination_order<'a, I>(
    network: &Network,
    scopes: I,
    to_eliminate: &BTreeSet<VarId>,
    heuristic: EliminationHeuristic,
) -> EliminationOrder
where
    I: IntoIterator<Item = &'a [VarId]>,
{
    let mut graph: BTreeMap<VarId, BTreeSet<VarId>> = BTreeMap::new();
    for scope in scopes {
        for &u in scope {
            let entry = graph.entry(u).or_default();
            entry.extend(scope.iter().copied().filter(|&v| v != u));
        }
    }
    for &v in to_eliminate {
        graph.entry(v).or_default();
    }

    let mut remaining = to_eliminate.clone();
    let mut variables = Vec::with_capacity(remaining.len());
    let mut induced_width = 0;

    while !remaining.is_empty() {
        let next = remaining
            .iter()
            .copied()
            .min_by(|&a, &b| {
                let key_a = (score(&graph, a, heuristic), network.name(a), a);
                let key_b = (score(&graph, b, heuristic), network.name(b), b);
                key_a.cmp(&key_b)
            })
            .unwrap_or(VarId(u32::MAX));
        if !remaining.remove(&next) {
            break;
        }

        let neighbours: Vec<VarId> = graph
            .remove(&next)
            .map(|n| n.into_iter().collect())
            .unwrap_or_default();
        induced_width = induced_width.max(neighbours.len());
        for &u in &neighbours {
            if let Some(adj) = graph.get_mut(&u) {
                adj.remove(&next);
                adj.extend(neighbours.iter().copied().filter(|&v| v != u));
            }
        }
        variables.push(next);
    }

    EliminationOrder {
        variables,
        induced_width,
    }
}

fn score(graph: &BTreeMap<VarId, BTreeSet<VarId>>, var: VarId, heuristic: EliminationHeuristic) -> usize {
    match heuristic {
        EliminationHeuristic::Lexicographic => 0,
        EliminationHeuristic::MinDegree => graph.get(&var).map_or(0, BTreeSet::len),
        EliminationHeuristic::MinFill => {
            let Some(neighbours) = graph.get(&var) else {
                return 0;
            };
            let neighbours: Vec<VarId> = neighbours.iter().copied().collect();
            let mut fill = 0;
            for i in 0..neighbours.len() {
                for j in (i + 1)..neighbours.len() {
                    let connected = graph
                        .get(&neighbours[i])
                        .is_some_and(|adj| adj.contains(&neighbours[j]));
                    if !connected {
                        fill += 1;
                    }
                }
            }
            fill
        }
    }
}
