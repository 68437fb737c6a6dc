use baynet::catalog::five_variable_network;
use baynet::engine::dsep::{d_separated, reachable};
use baynet::engine::query::{plan_estimation, EstimationPlan};
use baynet::{parse_and_resolve, parse_query, InferenceError};

#[test]
fn query_text_round_trips_through_labels() {
    let net = five_variable_network().unwrap();
    for text in ["P(+D)", "P(+E|-B)", "P(+A|+D,-E)", "P(+B,-E|+A)"] {
        assert_eq!(parse_and_resolve(&net, text).unwrap().label(&net), text);
    }
}

#[test]
fn named_states_resolve_like_signs() {
    let net = five_variable_network().unwrap();
    assert_eq!(
        parse_and_resolve(&net, "P(D=true | B=false)").unwrap(),
        parse_and_resolve(&net, "P(+D | -B)").unwrap()
    );
    assert_eq!(
        parse_and_resolve(&net, "P(D=1 | B=0)").unwrap(),
        parse_and_resolve(&net, "P(+D | -B)").unwrap()
    );
}

#[test]
fn malformed_queries_fail_with_parse_error() {
    assert!(matches!(parse_query("P(+D"), Err(InferenceError::ParseError(_))));
    assert!(matches!(parse_query("P(+D | )"), Err(InferenceError::ParseError(_))));
}

#[test]
fn d_separation_on_catalog_network() {
    let net = five_variable_network().unwrap();
    let id = |n: &str| net.var_id(n).unwrap();

    // B <- A -> C -> E
    assert!(!d_separated(&net, &[id("B")], &[id("E")], &[]).unwrap());
    assert!(d_separated(&net, &[id("B")], &[id("E")], &[id("A")]).unwrap());
    assert!(d_separated(&net, &[id("B")], &[id("E")], &[id("C")]).unwrap());
    // observing the collider D reconnects B and C
    assert!(!d_separated(&net, &[id("B")], &[id("E")], &[id("A"), id("D")]).unwrap());

    let from_a = reachable(&net, id("A"), &[]).unwrap();
    assert_eq!(from_a.len(), 5);
}

#[test]
fn planner_only_factors_independent_events() {
    let net = five_variable_network().unwrap();
    let plan = |text: &str| plan_estimation(&net, &parse_and_resolve(&net, text).unwrap()).unwrap();
    assert_eq!(plan("P(+D)"), EstimationPlan::Joint);
    assert_eq!(plan("P(+D,-A)"), EstimationPlan::Joint);
    assert!(matches!(plan("P(+B,-E|+A)"), EstimationPlan::Factored(_)));
    assert_eq!(plan("P(+B,-E|+A,+D)"), EstimationPlan::Joint);
}
