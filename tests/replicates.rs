//! Réplicas en paralelo sobre un único step compartido.

use assignflow_rust::replicates::{run_replicates, sites_table};
use assignflow_rust::{bind, declare_assignment, Arguments};

fn factorial_step() -> assignflow_rust::Step {
    let args = Arguments::new().arg("assignment_variable", "[Z1, Z2]")
                               .arg("blocks", "site")
                               .arg_for("Z2", "blocks", "Z1");
    bind(declare_assignment(args).expect("declare")).expect("bind")
}

#[test]
fn seeded_replicates_are_reproducible() {
    let step = factorial_step();
    let data = sites_table(8).expect("table");
    let a = run_replicates(&step, &data, 50, Some(11)).expect("replicates");
    let b = run_replicates(&step, &data, 50, Some(11)).expect("replicates");
    assert_eq!(a, b);
    assert_eq!(a.replicates, 50);
    assert_eq!(a.rows, 8);
}

#[test]
fn even_blocks_give_exact_half_share() {
    // 8 filas, 4 por sitio: cada réplica trata exactamente la mitad
    let summary = run_replicates(&factorial_step(), &sites_table(8).expect("table"), 40, None).expect("replicates");
    assert_eq!(summary.mean_treated_share.keys().collect::<Vec<_>>(), vec!["Z1", "Z2"]);
    for share in summary.mean_treated_share.values() {
        assert!((share - 0.5).abs() < 1e-12, "{share}");
    }
}

#[test]
fn runtime_errors_propagate() {
    let step = bind(declare_assignment(Arguments::new().arg("blocks", "missing")).expect("declare")).expect("bind");
    let err = run_replicates(&step, &sites_table(4).expect("table"), 8, Some(1)).expect_err("unbound");
    assert!(err.to_string().contains("missing"));
}

#[test]
fn summary_serializes_in_target_order() {
    let summary = run_replicates(&factorial_step(), &sites_table(8).expect("table"), 4, Some(3)).expect("replicates");
    let value = serde_json::to_value(&summary).expect("serialize");
    assert_eq!(value["replicates"], serde_json::json!(4));
    let keys: Vec<&String> = value["mean_treated_share"].as_object().expect("object").keys().collect();
    assert_eq!(keys, vec!["Z1", "Z2"]);
}
