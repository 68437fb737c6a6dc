use baynet::catalog::five_variable_network;
use baynet::engine::network::{Cpt, Network, NetworkBuilder, VarId};
use baynet::InferenceError;

#[test]
fn catalog_network_is_complete() {
    let net = five_variable_network().unwrap();
    assert!(net.check_model());
    assert!(net.validate_model().is_ok());
    let names: Vec<&str> = net.variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
}

#[test]
fn back_edge_is_a_cycle_error() {
    let mut net = Network::new();
    let ids: Vec<VarId> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|n| net.add_variable(n, 2).unwrap())
        .collect();
    net.add_edge(ids[0], ids[2]).unwrap();
    net.add_edge(ids[2], ids[4]).unwrap();

    let err = net.add_edge(ids[4], ids[0]).unwrap_err();
    assert_eq!(
        err,
        InferenceError::Cycle {
            parent: "E".into(),
            child: "A".into()
        }
    );
    // the failed edge leaves the graph untouched
    assert!(net.parents(ids[0]).is_empty());
}

#[test]
fn misshapen_cpt_is_rejected() {
    let err = NetworkBuilder::new()
        .variable("A", 2)
        .variable("B", 2)
        .edge("A", "B")
        .cpt("A", Cpt::binary(&[0.2]))
        .cpt("B", Cpt::binary(&[0.2]))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        InferenceError::DimensionMismatch {
            expected_rows: 2,
            expected_cols: 2,
            actual_cols: 1,
            ..
        }
    ));
}

#[test]
fn unnormalized_column_is_rejected() {
    let err = NetworkBuilder::new()
        .variable("A", 2)
        .cpt("A", Cpt::from_rows(vec![vec![0.5], vec![0.6]]))
        .build()
        .unwrap_err();
    match err {
        InferenceError::NonNormalized { variable, column, sum } => {
            assert_eq!(variable, "A");
            assert_eq!(column, 0);
            assert!((sum - 1.1).abs() < 1e-12);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn missing_cpt_fails_validation() {
    let mut net = Network::new();
    net.add_variable("A", 2).unwrap();
    assert!(!net.check_model());
    assert!(net.validate_model().is_err());
    assert!(NetworkBuilder::new().variable("A", 2).build().is_err());
}

#[test]
fn unknown_names_are_reported() {
    let net = five_variable_network().unwrap();
    assert_eq!(
        net.var_id("F").unwrap_err(),
        InferenceError::UnknownVariable("F".into())
    );
}
