use baynet::catalog::{five_variable_network, standard_queries};
use baynet::engine::elimination::{EliminationConfig, VariableElimination};
use baynet::engine::factor::Assignment;
use baynet::engine::ordering::EliminationHeuristic;
use baynet::{parse_and_resolve, InferenceError, Network};

fn exact(net: &Network, text: &str, heuristic: EliminationHeuristic) -> f64 {
    let ve = VariableElimination::with_config(
        net,
        EliminationConfig {
            heuristic,
            ..EliminationConfig::default()
        },
    )
    .unwrap();
    let q = parse_and_resolve(net, text).unwrap();
    ve.probability_of(&q.event, &q.evidence).unwrap()
}

#[test]
fn standard_queries_have_known_values() {
    let net = five_variable_network().unwrap();
    let h = EliminationHeuristic::MinFill;
    assert!((exact(&net, "P(+D)", h) - 0.32).abs() < 1e-9);
    assert!((exact(&net, "P(+D,-A)", h) - 0.184).abs() < 1e-9);
    assert!((exact(&net, "P(+E|-B)", h) - 0.52 / 0.85).abs() < 1e-9);
    assert!((exact(&net, "P(+A|+D,-E)", h) - 5.0 / 12.0).abs() < 1e-9);
    assert!((exact(&net, "P(+B,-E|+A)", h) - 0.288).abs() < 1e-9);
}

#[test]
fn every_heuristic_gives_the_same_answers() {
    let net = five_variable_network().unwrap();
    for q in standard_queries(&net).unwrap() {
        let reference = exact(&net, &q.label, EliminationHeuristic::MinFill);
        for h in [EliminationHeuristic::MinDegree, EliminationHeuristic::Lexicographic] {
            assert!(
                (exact(&net, &q.label, h) - reference).abs() < 1e-12,
                "{} differs under {}",
                q.label,
                h
            );
        }
    }
}

#[test]
fn conditional_distribution_is_normalized() {
    let net = five_variable_network().unwrap();
    let ve = VariableElimination::new(&net).unwrap();
    let a = net.var_id("A").unwrap();
    let c = net.var_id("C").unwrap();
    let d = net.var_id("D").unwrap();
    let evidence: Assignment = [(d, 1)].into_iter().collect();
    let dist = ve.query(&[c, a], &evidence).unwrap();
    assert_eq!(dist.variables(), &[c, a]);
    assert!((dist.values().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert!((dist.marginal(a).unwrap()[1] - 0.425).abs() < 1e-9);
    assert!((dist.marginal(c).unwrap()[1] - 0.2).abs() < 1e-9);
}

#[test]
fn repeated_queries_are_bit_identical() {
    let net = five_variable_network().unwrap();
    let ve = VariableElimination::new(&net).unwrap();
    let q = parse_and_resolve(&net, "P(+A|+D,-E)").unwrap();
    let first = ve.probability_of(&q.event, &q.evidence).unwrap();
    for _ in 0..10 {
        assert_eq!(
            ve.probability_of(&q.event, &q.evidence).unwrap().to_bits(),
            first.to_bits()
        );
    }
}

#[test]
fn joint_matches_marginals() {
    let net = five_variable_network().unwrap();
    let ve = VariableElimination::new(&net).unwrap();
    let joint = ve.joint().unwrap();
    assert_eq!(joint.values().len(), 32);
    let d = net.var_id("D").unwrap();
    assert!((joint.marginal(d).unwrap()[1] - 0.32).abs() < 1e-12);
}

#[test]
fn joint_equals_product_of_cpts_entry_by_entry() {
    let net = five_variable_network().unwrap();
    let ve = VariableElimination::new(&net).unwrap();
    let joint = ve.joint().unwrap();
    let ids: Vec<_> = net.ids().collect();
    assert_eq!(joint.variables(), ids.as_slice());

    let mut seen = 0;
    for (states, p) in joint.iter() {
        let expected: f64 = ids
            .iter()
            .map(|&v| {
                let column = net.parent_column(v, &states);
                net.cpt(v).unwrap().probability(states[v.index()], column)
            })
            .product();
        assert!(
            (p - expected).abs() < 1e-12,
            "joint entry {:?}: {} vs {}",
            states,
            p,
            expected
        );
        seen += 1;
    }
    assert_eq!(seen, 32);
    // all five false: 0.8 * 0.8 * 0.95 * 0.95 * 0.4
    assert!((joint.probability(&[0, 0, 0, 0, 0]).unwrap() - 0.23104).abs() < 1e-12);
}

#[test]
fn out_of_domain_evidence_is_rejected() {
    let net = five_variable_network().unwrap();
    let ve = VariableElimination::new(&net).unwrap();
    let a = net.var_id("A").unwrap();
    let b = net.var_id("B").unwrap();
    let evidence: Assignment = [(b, 2)].into_iter().collect();
    assert_eq!(
        ve.query(&[a], &evidence).unwrap_err(),
        InferenceError::InconsistentEvidence {
            variable: "B".into(),
            value: 2,
            domain_size: 2
        }
    );
}

#[test]
fn elimination_order_covers_hidden_variables() {
    let net = five_variable_network().unwrap();
    let ve = VariableElimination::new(&net).unwrap();
    let d = net.var_id("D").unwrap();
    let order = ve.elimination_order(&[d], &Assignment::new()).unwrap();
    assert_eq!(order.variables.len(), 4);
    assert!(!order.variables.contains(&d));
    assert!(order.induced_width <= 3);
}
