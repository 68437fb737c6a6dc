//! Built-in networks.
//!
//! The five-variable network has edges `A -> B`, `A -> C`, `B -> D`, `C -> D`
//! and `C -> E`. Every table lists the false outcome first and enumerates
//! parent configurations with the last parent varying fastest:
//!
//! | Variable | Parents | P(true \| column)          |
//! |----------|---------|----------------------------|
//! | A        |         | 0.2                        |
//! | B        | A       | 0.2, 0.8                   |
//! | C        | A       | 0.05, 0.2                  |
//! | D        | B, C    | 0.05, 0.8, 0.8, 0.8        |
//! | E        | C       | 0.6, 0.8                   |

use crate::engine::errors::Result;
use crate::engine::network::{Cpt, Network, NetworkBuilder};
use crate::engine::query::LabeledQuery;
use crate::parse_and_resolve;

/// The queries every report lists, in display order.
pub const STANDARD_QUERIES: [&str; 5] = [
    "P(+D)",
    "P(+D,-A)",
    "P(+E|-B)",
    "P(+A|+D,-E)",
    "P(+B,-E|+A)",
];

/// Builds the five-variable network `A..E`.
pub fn five_variable_network() -> Result<Network> {
    NetworkBuilder::new()
        .variable("A", 2)
        .variable("B", 2)
        .variable("C", 2)
        .variable("D", 2)
        .variable("E", 2)
        .edge("A", "B")
        .edge("A", "C")
        .edge("B", "D")
        .edge("C", "D")
        .edge("C", "E")
        .cpt("A", Cpt::binary(&[0.2]))
        .cpt("B", Cpt::binary(&[0.2, 0.8]))
        .cpt("C", Cpt::binary(&[0.05, 0.2]))
        .cpt("D", Cpt::binary(&[0.05, 0.8, 0.8, 0.8]))
        .cpt("E", Cpt::binary(&[0.6, 0.8]))
        .build()
}

/// [`STANDARD_QUERIES`] resolved against `network`, labeled with their text.
pub fn standard_queries(network: &Network) -> Result<Vec<LabeledQuery>> {
    STANDARD_QUERIES
        .iter()
        .map(|text| {
            Ok(LabeledQuery {
                label: text.to_string(),
                query: parse_and_resolve(network, text)?,
            })
        })
        .collect()
}
