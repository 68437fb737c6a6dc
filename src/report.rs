//! Side-by-side exact and sampled answers for a list of queries.
//!
//! [`build_report`] runs variable elimination and one Monte Carlo run over the
//! same queries. The samples are drawn once and every query filters the same
//! sample set. The [`Display`](std::fmt::Display) rendering prints two
//! blocks, exact then sampled, each value with three decimals.
//! [`ParityReport::differences`] renders the absolute differences separately.

use std::fmt;

use crate::engine::elimination::{EliminationConfig, VariableElimination};
use crate::engine::errors::Result;
use crate::engine::network::Network;
use crate::engine::query::{plan_estimation, EstimationPlan, LabeledQuery};
use crate::engine::sampling::{MonteCarlo, SamplerConfig};

/// Settings for both engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportConfig {
    pub elimination: EliminationConfig,
    pub sampler: SamplerConfig,
}

/// One query answered by both engines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportRow {
    pub label: String,
    pub exact: f64,
    pub estimate: f64,
    pub standard_error: f64,
    pub accepted_samples: usize,
    pub plan: EstimationPlan,
}

impl ReportRow {
    pub fn abs_difference(&self) -> f64 {
        (self.exact - self.estimate).abs()
    }
}

/// The full parity report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParityReport {
    pub config: ReportConfig,
    pub rows: Vec<ReportRow>,
}

impl ParityReport {
    /// The absolute-difference block, rendered on its own.
    pub fn differences(&self) -> Differences<'_> {
        Differences(self)
    }

    fn label_width(&self) -> usize {
        self.rows.iter().map(|r| r.label.len()).max().unwrap_or(0)
    }

    /// Largest absolute difference across all rows (0 for an empty report).
    pub fn max_abs_difference(&self) -> f64 {
        self.rows
            .iter()
            .map(ReportRow::abs_difference)
            .fold(0.0, f64::max)
    }
}

/// Answers every query exactly and by sampling.
pub fn build_report(network: &Network, queries: &[LabeledQuery], config: ReportConfig) -> Result<ParityReport> {
    let exact = VariableElimination::with_config(network, config.elimination)?;
    let sampler = MonteCarlo::new(network, config.sampler)?;
    let samples = sampler.generate();

    let mut rows = Vec::with_capacity(queries.len());
    for LabeledQuery { label, query } in queries {
        let p = exact.probability_of(&query.event, &query.evidence)?;
        let plan = plan_estimation(network, query)?;
        let sampled = samples.estimate_event(query, &plan)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            query = %label,
            exact = p,
            estimate = sampled.probability,
            plan = %sampled.plan,
            accepted = sampled.accepted_samples,
            "query answered"
        );

        rows.push(ReportRow {
            label: label.clone(),
            exact: p,
            estimate: sampled.probability,
            standard_error: sampled.standard_error,
            accepted_samples: sampled.accepted_samples,
            plan: sampled.plan,
        });
    }

    Ok(ParityReport { config, rows })
}

impl fmt::Display for ParityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.label_width();

        writeln!(f, "Exact inference (variable elimination)")?;
        for row in &self.rows {
            writeln!(f, "  {:<width$}  {:.3}", row.label, row.exact, width = width)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Monte Carlo estimate ({} samples, seed {})",
            self.config.sampler.sample_count, self.config.sampler.seed
        )?;
        for row in &self.rows {
            writeln!(f, "  {:<width$}  {:.3}", row.label, row.estimate, width = width)?;
        }
        Ok(())
    }
}

/// Display adapter for the absolute-difference block of a report.
#[derive(Debug, Clone, Copy)]
pub struct Differences<'a>(&'a ParityReport);

impl fmt::Display for Differences<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.0.label_width();
        writeln!(f, "Absolute difference")?;
        for row in &self.0.rows {
            writeln!(f, "  {:<width$}  {:.3}", row.label, row.abs_difference(), width = width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{five_variable_network, standard_queries};

    fn small_config() -> ReportConfig {
        ReportConfig {
            sampler: SamplerConfig {
                sample_count: 20_000,
                seed: 5,
                ..SamplerConfig::default()
            },
            ..ReportConfig::default()
        }
    }

    #[test]
    fn report_has_one_row_per_query() {
        let net = five_variable_network().unwrap();
        let queries = standard_queries(&net).unwrap();
        let report = build_report(&net, &queries, small_config()).unwrap();
        assert_eq!(report.rows.len(), 5);
        assert_eq!(report.rows[0].label, "P(+D)");
        assert!((report.rows[0].exact - 0.32).abs() < 1e-12);
        assert!(matches!(report.rows[4].plan, EstimationPlan::Factored(_)));
        assert!(report.max_abs_difference() < 0.05);
    }

    #[test]
    fn rendering_has_two_blocks_with_three_decimals() {
        let net = five_variable_network().unwrap();
        let queries = standard_queries(&net).unwrap();
        let text = build_report(&net, &queries, small_config()).unwrap().to_string();
        assert!(text.contains("Exact inference (variable elimination)"));
        assert!(text.contains("Monte Carlo estimate (20000 samples, seed 5)"));
        assert!(!text.contains("Absolute difference"));
        assert_eq!(text.lines().filter(|l| !l.starts_with(' ') && !l.is_empty()).count(), 2);
        assert!(text.contains("  P(+D)        0.320\n"));
        assert!(text.contains("  P(+D,-A)     0.184\n"));
        assert!(text.contains("  P(+B,-E|+A)  0.288\n"));
    }

    #[test]
    fn empty_report_renders_headers_only() {
        let net = five_variable_network().unwrap();
        let report = build_report(&net, &[], small_config()).unwrap();
        assert_eq!(report.max_abs_difference(), 0.0);
        assert_eq!(report.to_string().lines().count(), 3);
        assert_eq!(report.differences().to_string(), "Absolute difference\n");
    }

    #[test]
    fn differences_render_separately() {
        let net = five_variable_network().unwrap();
        let queries = standard_queries(&net).unwrap();
        let report = build_report(&net, &queries, small_config()).unwrap();
        let text = report.differences().to_string();
        assert!(text.starts_with("Absolute difference\n"));
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("  P(+D)        0.0"));
    }
}
