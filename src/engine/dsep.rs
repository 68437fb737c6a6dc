//! d-separation via the "reachable" trail search (Koller & Friedman, Alg. 3.1).
//!
//! The sampler uses this to decide whether a compound event may be estimated
//! as a product of separately filtered frequencies: that shortcut is exact in
//! the limit only when the event's variables are conditionally independent
//! given the evidence.

use std::collections::BTreeSet;

use crate::engine::errors::Result;
use crate::engine::network::{Network, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Trail arrives from a child (moving towards parents)
    Up,
    /// Trail arrives from a parent (moving towards children)
    Down,
}

/// All variables reachable from `source` through an active trail given `observed`.
///
/// Observed variables are never reported as reachable. `source` itself is
/// included unless observed.
pub fn reachable(network: &Network, source: VarId, observed: &[VarId]) -> Result<BTreeSet<VarId>> {
    network.check_id(source)?;
    let n = network.len();
    let mut is_observed = vec![false; n];
    for &z in observed {
        network.check_id(z)?;
        is_observed[z.index()] = true;
    }

    // Observed nodes and their ancestors: the colliders that activate v-structures.
    let mut has_observed_descendant = vec![false; n];
    let mut stack: Vec<VarId> = observed.to_vec();
    while let Some(v) = stack.pop() {
        if std::mem::replace(&mut has_observed_descendant[v.index()], true) {
            continue;
        }
        stack.extend(network.parents(v).iter().copied());
    }

    let mut visited_up = vec![false; n];
    let mut visited_down = vec![false; n];
    let mut result = BTreeSet::new();
    let mut frontier = vec![(source, Direction::Up)];

    while let Some((v, dir)) = frontier.pop() {
        let seen = match dir {
            Direction::Up => &mut visited_up[v.index()],
            Direction::Down => &mut visited_down[v.index()],
        };
        if std::mem::replace(seen, true) {
            continue;
        }
        if !is_observed[v.index()] {
            result.insert(v);
        }

        match dir {
            Direction::Up if !is_observed[v.index()] => {
                frontier.extend(network.parents(v).iter().map(|&p| (p, Direction::Up)));
                frontier.extend(network.children(v).iter().map(|&c| (c, Direction::Down)));
            }
            Direction::Up => {}
            Direction::Down => {
                if !is_observed[v.index()] {
                    frontier.extend(network.children(v).iter().map(|&c| (c, Direction::Down)));
                }
                if has_observed_descendant[v.index()] {
                    frontier.extend(network.parents(v).iter().map(|&p| (p, Direction::Up)));
                }
            }
        }
    }

    Ok(result)
}

/// True if every variable in `xs` is d-separated from every variable in `ys` given `observed`.
pub fn d_separated(network: &Network, xs: &[VarId], ys: &[VarId], observed: &[VarId]) -> Result<bool> {
    for &x in xs {
        let active = reachable(network, x, observed)?;
        if ys.iter().any(|y| active.contains(y)) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True if the given variables are pairwise d-separated given `observed`.
pub fn pairwise_d_separated(network: &Network, vars: &[VarId], observed: &[VarId]) -> Result<bool> {
    for (i, &x) in vars.iter().enumerate() {
        if !d_separated(network, &[x], &vars[i + 1..], observed)? {
            return Ok(false);
        }
    }
    Ok(true)
}
