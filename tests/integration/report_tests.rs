use baynet::catalog::{five_variable_network, standard_queries};
use baynet::engine::elimination::EliminationConfig;
use baynet::engine::ordering::EliminationHeuristic;
use baynet::engine::sampling::SamplerConfig;
use baynet::report::{build_report, ReportConfig};

#[test]
fn million_sample_report_agrees_within_tolerance() {
    let net = five_variable_network().unwrap();
    let queries = standard_queries(&net).unwrap();
    let report = build_report(
        &net,
        &queries,
        ReportConfig {
            sampler: SamplerConfig {
                sample_count: 1_000_000,
                seed: 2024,
                ..SamplerConfig::default()
            },
            ..ReportConfig::default()
        },
    )
    .unwrap();

    let expected = [0.32, 0.184, 0.52 / 0.85, 5.0 / 12.0, 0.288];
    for (row, exact) in report.rows.iter().zip(expected) {
        assert!((row.exact - exact).abs() < 1e-9, "{}", row.label);
        assert!(
            row.abs_difference() < 0.01,
            "{}: exact {} vs sampled {}",
            row.label,
            row.exact,
            row.estimate
        );
    }
}

#[test]
fn report_is_reproducible_for_fixed_config() {
    let net = five_variable_network().unwrap();
    let queries = standard_queries(&net).unwrap();
    let config = ReportConfig {
        elimination: EliminationConfig {
            heuristic: EliminationHeuristic::Lexicographic,
            ..EliminationConfig::default()
        },
        sampler: SamplerConfig {
            sample_count: 50_000,
            seed: 1,
            shards: 3,
            ..SamplerConfig::default()
        },
    };
    let a = build_report(&net, &queries, config).unwrap();
    let b = build_report(&net, &queries, config).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());
}

#[cfg(feature = "serde")]
#[test]
fn report_serializes_to_json() {
    let net = five_variable_network().unwrap();
    let queries = standard_queries(&net).unwrap();
    let report = build_report(
        &net,
        &queries,
        ReportConfig {
            sampler: SamplerConfig {
                sample_count: 10_000,
                ..SamplerConfig::default()
            },
            ..ReportConfig::default()
        },
    )
    .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rows"].as_array().unwrap().len(), 5);
    assert_eq!(json["rows"][0]["label"], "P(+D)");
    assert_eq!(json["config"]["sampler"]["sample_count"], 10_000);
}
