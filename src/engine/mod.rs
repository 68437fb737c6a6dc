//! The inference engine for discrete Bayesian networks.
//!
//! This module provides:
//! - **errors**: Error type shared by every operation
//! - **network**: Variables, DAG structure and conditional probability tables
//! - **factor**: Factor algebra (product, sum-out, reduce, normalize)
//! - **ordering**: Elimination-order heuristics
//! - **elimination**: Exact inference by variable elimination
//! - **distribution**: Result distributions for both engines
//! - **sampling**: Forward sampling with rejection
//! - **dsep** / **query**: d-separation and estimation planning for compound events

pub mod errors;
pub mod network;
pub mod factor;
pub mod ordering;
pub mod distribution;
pub mod elimination;
pub mod dsep;
pub mod query;
pub mod sampling;
