use crate::*;

/// A membership change rebuilds every throttle at the new split, with fresh
/// usage.
#[test]
fn test_node_count_change_rebuilds_generation() {
    let mut node = Node::new(2, &test_config()).unwrap();
    for i in 0..10 {
        assert!(node.handle(
            &TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1),
            t0().plus_nanos(i)
        ));
    }
    assert!(!node.handle(
        &TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1),
        t0().plus_nanos(10)
    ));

    node.accumulator.set_node_count(1).unwrap();
    assert!(node.accumulator.all_active_throttles().iter().all(|t| t.used() == 0));
    // Bucket B now holds 20 calls at 10 tps over a 2s burst.
    let admitted = (0..25)
        .filter(|&i| {
            node.handle(
                &TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1),
                t0().plus_nanos(100 + i),
            )
        })
        .count();
    assert_eq!(admitted, 20);
}

/// Redefined buckets take effect wholesale; a rejected redefinition leaves
/// the running generation alone.
#[test]
fn test_redefinition_replaces_or_keeps() {
    let mut node = Node::new(2, &test_config()).unwrap();
    let mut tighter = definitions();
    tighter.buckets[3].throttle_groups[0].ops_per_sec = 2;
    tighter.buckets[3].throttle_groups[1].ops_per_sec = 2;
    node.accumulator.rebuild_for(&tighter).unwrap();
    assert_eq!(node.accumulator.registry().definitions(), &tighter);

    let mut broken = definitions();
    broken.buckets[1].throttle_groups.clear();
    assert!(node.accumulator.rebuild_for(&broken).is_err());
    assert_eq!(node.accumulator.registry().definitions(), &tighter);
}

/// Definitions survive compile and re-serialization byte for byte.
#[test]
fn test_definitions_round_trip() {
    let node = Node::new(2, &test_config()).unwrap();
    let compact = definitions().to_json().unwrap();
    assert_eq!(node.accumulator.registry().definitions().to_json().unwrap(), compact);
    assert_eq!(
        ThrottleDefinitions::from_json(&compact).unwrap(),
        *node.accumulator.registry().definitions()
    );
}

/// Bucket D cannot serve a single `GetVersionInfo` once split five ways.
#[test]
fn test_too_many_nodes_is_rejected() {
    let Err(err) = Node::new(5, &test_config()) else {
        panic!("five nodes accepted");
    };
    assert!(format!("{err:#}").contains("unsatisfiable"), "{err:#}");

    let mut node = Node::new(2, &test_config()).unwrap();
    assert!(node.accumulator.set_node_count(5).is_err());
    assert_eq!(node.accumulator.node_count(), 2);
}
