//! baynet CLI - exact vs sampled answers on the built-in five-variable network
//!
//! Usage:
//!   baynet                                   # Standard report, 1M samples
//!   baynet --samples 100000 --seed 7         # Smaller run, other stream
//!   baynet --query "P(+C | +D)" -o json      # Custom queries as JSON
//!
//! Set `RUST_LOG=baynet=debug` to trace elimination orders and plans.

use std::process;

use baynet::catalog::{five_variable_network, standard_queries};
use baynet::engine::elimination::EliminationConfig;
use baynet::engine::ordering::EliminationHeuristic;
use baynet::engine::sampling::SamplerConfig;
use baynet::report::{build_report, ParityReport, ReportConfig};
use baynet::{parse_and_resolve, LabeledQuery};
use clap::Parser;

#[derive(Parser)]
#[command(name = "baynet")]
#[command(version)]
#[command(about = "baynet - exact and Monte Carlo inference on a discrete Bayesian network")]
#[command(long_about = "Answer probability queries on the built-in A..E network by variable elimination and by forward sampling with rejection, and compare the two")]
struct Cli {
    /// Number of joint samples to draw
    #[arg(short = 'n', long, default_value_t = 1_000_000, value_name = "N")]
    samples: usize,

    /// Base seed for the random streams
    #[arg(short, long, default_value_t = 0, value_name = "SEED")]
    seed: u64,

    /// Elimination ordering: min-fill, min-degree or lexicographic
    #[arg(long, default_value = "min-fill", value_name = "HEURISTIC")]
    heuristic: String,

    /// Independent sampling streams (run in parallel with the `parallel` feature)
    #[arg(long, default_value_t = 1, value_name = "K")]
    shards: usize,

    /// Query in P(+X, -Y | Z=state) notation; repeatable. Defaults to the standard five
    #[arg(short, long = "query", value_name = "QUERY")]
    queries: Vec<String>,

    /// Append the absolute-difference block to the summary output
    #[arg(long)]
    differences: bool,

    /// Output format: summary, json, or debug
    #[arg(short, long, default_value = "summary", value_name = "FORMAT")]
    output: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let network = match five_variable_network() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error building network: {}", e);
            process::exit(1);
        }
    };

    let heuristic: EliminationHeuristic = match cli.heuristic.parse() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Invalid --heuristic: {}", e);
            process::exit(1);
        }
    };

    let queries = if cli.queries.is_empty() {
        standard_queries(&network)
    } else {
        cli.queries
            .iter()
            .map(|text| {
                Ok(LabeledQuery {
                    label: text.trim().to_string(),
                    query: parse_and_resolve(&network, text)?,
                })
            })
            .collect()
    };
    let queries = match queries {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Query error: {}", e);
            process::exit(1);
        }
    };

    let config = ReportConfig {
        elimination: EliminationConfig {
            heuristic,
            ..EliminationConfig::default()
        },
        sampler: SamplerConfig {
            sample_count: cli.samples,
            seed: cli.seed,
            shards: cli.shards,
            ..SamplerConfig::default()
        },
    };

    let report = match build_report(&network, &queries, config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Inference error: {}", e);
            process::exit(1);
        }
    };

    match cli.output.as_str() {
        "json" => print_json(&report),
        "debug" => println!("{:#?}", report),
        "summary" => {
            print!("{}", report);
            if cli.differences {
                print!("\n{}", report.differences());
            }
        }
        other => {
            eprintln!("Unknown output format '{}', expected summary, json or debug", other);
            process::exit(1);
        }
    }
}

#[cfg(feature = "serde")]
fn print_json(report: &ParityReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(not(feature = "serde"))]
fn print_json(_report: &ParityReport) {
    eprintln!("JSON output requires the `serde` feature");
    process::exit(1);
}

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
fn init_tracing() {}
