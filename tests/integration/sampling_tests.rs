use baynet::catalog::five_variable_network;
use baynet::engine::elimination::VariableElimination;
use baynet::engine::factor::Assignment;
use baynet::engine::query::{plan_estimation, EstimationPlan};
use baynet::engine::sampling::{estimate, seeded_rng, ForwardSampler, MonteCarlo, SamplerConfig};
use baynet::{parse_and_resolve, Cpt, InferenceError, NetworkBuilder};

fn config(sample_count: usize, seed: u64, shards: usize) -> SamplerConfig {
    SamplerConfig {
        sample_count,
        seed,
        shards,
        ..SamplerConfig::default()
    }
}

#[test]
fn marginal_of_d_converges_to_exact_value() {
    let net = five_variable_network().unwrap();
    let d = net.var_id("D").unwrap();
    let exact = VariableElimination::new(&net)
        .unwrap()
        .query(&[d], &Assignment::new())
        .unwrap();

    let est = estimate(&net, &[d], &Assignment::new(), 1_000_000, 42).unwrap();
    assert_eq!(est.confidence.total_samples, 1_000_000);
    assert_eq!(est.confidence.accepted_samples, 1_000_000);
    assert!((est.distribution.values()[1] - exact.values()[1]).abs() < 0.01);
    assert!((est.distribution.values()[1] - 0.32).abs() < 0.01);
}

#[test]
fn conditional_estimate_tracks_exact_value() {
    let net = five_variable_network().unwrap();
    let q = parse_and_resolve(&net, "P(+A|+D,-E)").unwrap();
    let mc = MonteCarlo::new(&net, config(500_000, 11, 1)).unwrap();
    let est = mc.estimate_event(&q).unwrap();
    assert_eq!(est.plan, EstimationPlan::Joint);
    assert!((est.probability - 5.0 / 12.0).abs() < 0.01);
    // about 11.5% of samples agree with D=1, E=0
    assert!(est.accepted_samples > 50_000 && est.accepted_samples < 65_000);
    assert!(est.standard_error > 0.0 && est.standard_error < 0.005);
}

#[test]
fn same_seed_is_reproducible_and_other_seeds_differ() {
    let net = five_variable_network().unwrap();
    let d = net.var_id("D").unwrap();
    let a = estimate(&net, &[d], &Assignment::new(), 10_000, 3).unwrap();
    let b = estimate(&net, &[d], &Assignment::new(), 10_000, 3).unwrap();
    let c = estimate(&net, &[d], &Assignment::new(), 10_000, 4).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.distribution.values(), c.distribution.values());
}

#[test]
fn sharded_runs_are_reproducible() {
    let net = five_variable_network().unwrap();
    let first = MonteCarlo::new(&net, config(40_000, 9, 4)).unwrap().generate();
    let second = MonteCarlo::new(&net, config(40_000, 9, 4)).unwrap().generate();
    assert_eq!(first.len(), 40_000);
    assert_eq!(first, second);

    // shard 0 of a sharded run is the plain stream of the base seed
    let sampler = ForwardSampler::new(&net).unwrap();
    let plain = sampler.sample_set(&mut seeded_rng(9), 10_000);
    assert!(first.iter().take(10_000).eq(plain.iter()));
}

#[test]
fn factored_and_joint_plans_agree_on_compound_query() {
    let net = five_variable_network().unwrap();
    let q = parse_and_resolve(&net, "P(+B,-E|+A)").unwrap();
    let plan = plan_estimation(&net, &q).unwrap();
    assert!(matches!(plan, EstimationPlan::Factored(ref vars) if vars.len() == 2));

    let samples = MonteCarlo::new(&net, config(1_000_000, 21, 1)).unwrap().generate();
    let factored = samples.estimate_event(&q, &plan).unwrap();
    let joint = samples.estimate_event(&q, &EstimationPlan::Joint).unwrap();
    assert!((factored.probability - 0.288).abs() < 0.01);
    assert!((joint.probability - 0.288).abs() < 0.01);
    assert!((factored.probability - joint.probability).abs() < 0.01);
}

#[test]
fn impossible_evidence_yields_insufficient_samples() {
    let net = NetworkBuilder::new()
        .variable("Never", 2)
        .variable("Child", 2)
        .edge("Never", "Child")
        .cpt("Never", Cpt::binary(&[0.0]))
        .cpt("Child", Cpt::binary(&[0.5, 0.5]))
        .build()
        .unwrap();
    let never = net.var_id("Never").unwrap();
    let child = net.var_id("Child").unwrap();
    let evidence: Assignment = [(never, 1)].into_iter().collect();
    assert_eq!(
        estimate(&net, &[child], &evidence, 1_000, 0).unwrap_err(),
        InferenceError::InsufficientSamples { total: 1_000 }
    );
}

#[test]
fn oversized_runs_are_refused() {
    let net = five_variable_network().unwrap();
    let too_many = SamplerConfig {
        sample_count: 1_001,
        max_samples: 1_000,
        ..SamplerConfig::default()
    };
    assert!(matches!(
        MonteCarlo::new(&net, too_many),
        Err(InferenceError::ResourceLimit(_))
    ));
}
