//! # Network Definition
//!
//! A Bayesian network is a directed acyclic graph of discrete random variables,
//! each carrying a conditional probability table (CPT) over its parents.
//!
//! ## Conventions
//!
//! - Domains are `0..cardinality`. Boolean variables use `false = 0`, `true = 1`.
//! - A CPT for `V` with ordered parents `P1..Pk` has `card(V)` rows and
//!   `card(P1) * .. * card(Pk)` columns. Row 0 is the "false" outcome.
//! - Columns enumerate parent assignments with the **last** parent varying
//!   fastest, so for two binary parents the columns are
//!   `(0,0), (0,1), (1,0), (1,1)`.
//!
//! ## Invariants
//!
//! - The graph is always a DAG: [`Network::add_edge`] refuses edges that would
//!   close a cycle.
//! - A node's parent set is frozen once its CPT is attached.
//! - Every attached CPT has the right shape and normalized columns.
//!
//! ## Example
//!
//! ```rust,ignore
//! use baynet::engine::network::{Cpt, Network};
//!
//! let mut net = Network::new();
//! let rain = net.add_variable("Rain", 2)?;
//! let wet = net.add_variable("Wet", 2)?;
//! net.add_edge(rain, wet)?;
//! net.attach_cpt(rain, Cpt::from_rows(vec![vec![0.8], vec![0.2]]))?;
//! net.attach_cpt(wet, Cpt::from_rows(vec![vec![0.9, 0.1], vec![0.1, 0.9]]))?;
//! assert!(net.check_model());
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::engine::errors::{InferenceError, Result};

/// Maximum allowed deviation of a CPT column sum from 1.0.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// A dense identifier for a variable, assigned in declaration order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(pub u32);

impl VarId {
    /// Position of this variable in the network's dense storage.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A discrete random variable with a finite, labelled domain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// The unique variable identifier
    pub id: VarId,
    /// Human-readable name, unique within a network
    pub name: String,
    /// State labels; `states[0]` is the "false"/first outcome
    pub states: Vec<String>,
}

impl Variable {
    /// Number of states in the domain.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    /// Returns the index of a state label, if present.
    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s == label)
    }
}

/// A conditional probability table, stored row-major as given by the caller.
///
/// The table is only checked against the network when it is attached with
/// [`Network::attach_cpt`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cpt {
    rows: Vec<Vec<f64>>,
}

impl Cpt {
    /// Builds a table from rows; `rows[state][parent_column]`.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Builds a prior (parentless) table from a distribution over states.
    pub fn prior(probs: &[f64]) -> Self {
        Self {
            rows: probs.iter().map(|&p| vec![p]).collect(),
        }
    }

    /// Builds a binary table from P(true | column) for each parent column.
    ///
    /// The false row is filled with the complements.
    pub fn binary(p_true: &[f64]) -> Self {
        Self {
            rows: vec![p_true.iter().map(|p| 1.0 - p).collect(), p_true.to_vec()],
        }
    }

    /// Number of rows (states of the child variable).
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (parent assignments). Zero for an empty table.
    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// P(state | parent column).
    #[inline]
    pub fn probability(&self, state: usize, column: usize) -> f64 {
        self.rows[state][column]
    }

    /// Iterates the distribution stored in one column.
    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[column])
    }

    fn validate(&self, variable: &str, expected_rows: usize, expected_cols: usize) -> Result<()> {
        let ragged = self.rows.iter().any(|r| r.len() != self.cols());
        if self.rows() != expected_rows || self.cols() != expected_cols || ragged {
            return Err(InferenceError::DimensionMismatch {
                variable: variable.to_string(),
                expected_rows,
                expected_cols,
                actual_rows: self.rows(),
                actual_cols: if ragged {
                    self.rows.iter().map(Vec::len).max().unwrap_or(0)
                } else {
                    self.cols()
                },
            });
        }

        for column in 0..expected_cols {
            let mut sum = 0.0;
            for p in self.column(column) {
                if !p.is_finite() || p < 0.0 {
                    return Err(InferenceError::NonNormalized {
                        variable: variable.to_string(),
                        column,
                        sum: p,
                    });
                }
                sum += p;
            }
            if (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
                return Err(InferenceError::NonNormalized {
                    variable: variable.to_string(),
                    column,
                    sum,
                });
            }
        }
        Ok(())
    }
}

/// A discrete Bayesian network: variables, a DAG over them, and CPTs.
#[derive(Debug, Clone, Default)]
pub struct Network {
    variables: Vec<Variable>,
    index: FxHashMap<String, VarId>,
    parents: Vec<Vec<VarId>>,
    children: Vec<Vec<VarId>>,
    cpts: Vec<Option<Cpt>>,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable with `domain_size` states.
    ///
    /// Binary variables get the labels `false`/`true`; larger domains get
    /// `s0`, `s1`, ...
    pub fn add_variable(&mut self, name: &str, domain_size: usize) -> Result<VarId> {
        let states = if domain_size == 2 {
            vec!["false".to_string(), "true".to_string()]
        } else {
            (0..domain_size).map(|i| format!("s{}", i)).collect()
        };
        self.add_variable_with_states(name, states)
    }

    /// Declares a variable with explicit state labels.
    pub fn add_variable_with_states(&mut self, name: &str, states: Vec<String>) -> Result<VarId> {
        if states.is_empty() {
            return Err(InferenceError::ValidationError(format!(
                "variable '{}' must have a non-empty domain",
                name
            )));
        }
        if self.index.contains_key(name) {
            return Err(InferenceError::ValidationError(format!(
                "variable '{}' is already declared",
                name
            )));
        }
        let id = VarId(self.variables.len() as u32);
        self.variables.push(Variable {
            id,
            name: name.to_string(),
            states,
        });
        self.index.insert(name.to_string(), id);
        self.parents.push(Vec::new());
        self.children.push(Vec::new());
        self.cpts.push(None);
        Ok(id)
    }

    /// Adds the directed edge `parent -> child`.
    ///
    /// Parents are ordered by insertion; that order fixes the CPT column layout.
    /// Re-adding an existing edge is a no-op.
    pub fn add_edge(&mut self, parent: VarId, child: VarId) -> Result<()> {
        self.check_id(parent)?;
        self.check_id(child)?;

        if self.parents[child.index()].contains(&parent) {
            return Ok(());
        }
        if parent == child || self.reaches(child, parent) {
            return Err(InferenceError::Cycle {
                parent: self.name(parent).to_string(),
                child: self.name(child).to_string(),
            });
        }
        if self.cpts[child.index()].is_some() {
            return Err(InferenceError::ValidationError(format!(
                "parents of '{}' are fixed once its CPT is attached",
                self.name(child)
            )));
        }

        self.parents[child.index()].push(parent);
        self.children[parent.index()].push(child);
        Ok(())
    }

    /// Adds an edge between two variables identified by name.
    pub fn add_edge_by_name(&mut self, parent: &str, child: &str) -> Result<()> {
        let parent = self.var_id(parent)?;
        let child = self.var_id(child)?;
        self.add_edge(parent, child)
    }

    /// Attaches (or replaces) the CPT of `variable` after validating its shape
    /// and normalization.
    pub fn attach_cpt(&mut self, variable: VarId, table: Cpt) -> Result<()> {
        self.check_id(variable)?;
        let expected_rows = self.cardinality(variable);
        let expected_cols = self.parent_configurations(variable);
        table.validate(self.name(variable), expected_rows, expected_cols)?;
        self.cpts[variable.index()] = Some(table);
        Ok(())
    }

    /// Attaches a CPT to a variable identified by name.
    pub fn attach_cpt_by_name(&mut self, variable: &str, table: Cpt) -> Result<()> {
        let id = self.var_id(variable)?;
        self.attach_cpt(id, table)
    }

    /// Returns true iff every variable has a validated CPT and the graph is acyclic.
    pub fn check_model(&self) -> bool {
        self.validate_model().is_ok()
    }

    /// Like [`Network::check_model`], but reports what is wrong.
    pub fn validate_model(&self) -> Result<()> {
        if let Some(missing) = self.variables.iter().find(|v| self.cpts[v.id.index()].is_none()) {
            return Err(InferenceError::ValidationError(format!(
                "variable '{}' has no CPT attached",
                missing.name
            )));
        }
        self.topological_order().map(|_| ())
    }

    /// Orders variables so every parent precedes its children.
    ///
    /// Uses Kahn's algorithm; among ready variables the lowest id goes first,
    /// so the order is deterministic.
    pub fn topological_order(&self) -> Result<Vec<VarId>> {
        let mut in_degree: Vec<usize> = self.parents.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<VarId>> = self
            .variables
            .iter()
            .filter(|v| in_degree[v.id.index()] == 0)
            .map(|v| Reverse(v.id))
            .collect();

        let mut order = Vec::with_capacity(self.variables.len());
        while let Some(Reverse(var)) = ready.pop() {
            order.push(var);
            for &child in &self.children[var.index()] {
                in_degree[child.index()] -= 1;
                if in_degree[child.index()] == 0 {
                    ready.push(Reverse(child));
                }
            }
        }

        if order.len() != self.variables.len() {
            // every unordered variable sits on or below a cycle; report one edge between two of them
            let stuck = |v: &VarId| in_degree[v.index()] > 0;
            let edge = self.ids().filter(|v| stuck(v)).find_map(|child| {
                self.parents[child.index()]
                    .iter()
                    .find(|p| stuck(*p))
                    .map(|&parent| (parent, child))
            });
            return Err(match edge {
                Some((parent, child)) => InferenceError::Cycle {
                    parent: self.name(parent).to_string(),
                    child: self.name(child).to_string(),
                },
                None => InferenceError::Internal("topological sort stalled without a cycle".into()),
            });
        }
        Ok(order)
    }

    /// Looks up a variable id by name.
    pub fn var_id(&self, name: &str) -> Result<VarId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| InferenceError::UnknownVariable(name.to_string()))
    }

    /// Returns the variable with the given id.
    pub fn variable(&self, id: VarId) -> Result<&Variable> {
        self.variables
            .get(id.index())
            .ok_or_else(|| InferenceError::UnknownVariable(format!("#{}", id.0)))
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Iterates all variable ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables.iter().map(|v| v.id)
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// True if no variables are declared.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Ordered parents of `id`. Panics on an id from another network.
    pub fn parents(&self, id: VarId) -> &[VarId] {
        &self.parents[id.index()]
    }

    /// Children of `id` in edge insertion order.
    pub fn children(&self, id: VarId) -> &[VarId] {
        &self.children[id.index()]
    }

    /// The attached CPT of `id`, if any.
    pub fn cpt(&self, id: VarId) -> Option<&Cpt> {
        self.cpts.get(id.index()).and_then(Option::as_ref)
    }

    /// Name of a variable known to belong to this network.
    pub fn name(&self, id: VarId) -> &str {
        &self.variables[id.index()].name
    }

    /// Domain size of a variable known to belong to this network.
    pub fn cardinality(&self, id: VarId) -> usize {
        self.variables[id.index()].cardinality()
    }

    /// Product of the parents' domain sizes (1 for a root).
    pub fn parent_configurations(&self, id: VarId) -> usize {
        self.parents[id.index()]
            .iter()
            .map(|&p| self.cardinality(p))
            .product()
    }

    /// CPT column selected by the parents' states in a full assignment
    /// indexed by [`VarId::index`].
    #[inline]
    pub fn parent_column(&self, id: VarId, states: &[usize]) -> usize {
        self.parents[id.index()]
            .iter()
            .fold(0, |col, &p| col * self.cardinality(p) + states[p.index()])
    }

    pub(crate) fn check_id(&self, id: VarId) -> Result<()> {
        if id.index() < self.variables.len() {
            Ok(())
        } else {
            Err(InferenceError::UnknownVariable(format!("#{}", id.0)))
        }
    }

    /// True if a directed path `from -> .. -> to` exists.
    fn reaches(&self, from: VarId, to: VarId) -> bool {
        let mut visited = vec![false; self.variables.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if std::mem::replace(&mut visited[current.index()], true) {
                continue;
            }
            stack.extend(self.children[current.index()].iter().copied());
        }
        false
    }
}

/// Fluent builder that defers error reporting to [`NetworkBuilder::build`].
///
/// ```rust,ignore
/// let net = NetworkBuilder::new()
///     .variable("A", 2)
///     .variable("B", 2)
///     .edge("A", "B")
///     .cpt("A", Cpt::binary(&[0.2]))
///     .cpt("B", Cpt::binary(&[0.2, 0.8]))
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    network: Network,
    error: Option<InferenceError>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, name: &str, domain_size: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.network.add_variable(name, domain_size) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn edge(mut self, parent: &str, child: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.network.add_edge_by_name(parent, child) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn cpt(mut self, variable: &str, table: Cpt) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.network.attach_cpt_by_name(variable, table) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Returns the first recorded error, or the network if it is complete.
    pub fn build(self) -> Result<Network> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.network.validate_model()?;
        Ok(self.network)
    }
}
