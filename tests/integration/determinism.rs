use crate::*;

/// Nodes fed the same stream agree on every decision, every throttle, and
/// every multiplier.
#[test]
fn test_replicas_reach_identical_state() {
    let config = test_config();
    let mut node_a = Node::new(3, &config).unwrap();
    let mut node_b = Node::new(3, &config).unwrap();

    let stream = workload(5_000, 250_000);
    let mut admitted = 0;
    for (usage, now) in &stream {
        let a = node_a.handle(usage, *now);
        let b = node_b.handle(usage, *now);
        assert_eq!(a, b, "decisions diverged for {:?} at {}", usage, now);
        admitted += usize::from(a);
    }
    assert!(admitted > 0 && admitted < stream.len(), "workload should hit the throttles");

    assert_eq!(
        node_a.accumulator.all_active_throttles(),
        node_b.accumulator.all_active_throttles()
    );
    assert_eq!(
        node_a.accumulator.gas_limit_throttle(),
        node_b.accumulator.gas_limit_throttle()
    );
    assert_eq!(node_a.sources.snapshot(), node_b.sources.snapshot());

    let (_, last) = stream[stream.len() - 1];
    for op in [OperationTag::ContractCall, OperationTag::CryptoTransfer] {
        assert_eq!(
            node_a.sources.current_multiplier(op, last),
            node_b.sources.current_multiplier(op, last)
        );
    }
}

/// Exempt payers never move any throttle.
#[test]
fn test_exempt_payers_leave_no_trace() {
    let mut node = Node::new(3, &test_config()).unwrap();
    for i in 0..1_000 {
        let usage = TxnUsage::new(OperationTag::ContractCall, 42).with_gas_limit(1_000_000);
        assert!(node.handle(&usage, t0().plus_nanos(i)));
    }
    assert!(node.accumulator.all_active_throttles().iter().all(|t| t.used() == 0));
    assert_eq!(node.accumulator.gas_limit_throttle().map(|t| t.used()), Some(0));
}

/// Refunded gas is available to the next transaction.
#[test]
fn test_gas_refund_reopens_capacity() {
    let mut node = Node::new(3, &test_config()).unwrap();
    let heavy = TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1_500_000);
    assert!(node.handle(&heavy, t0()));
    assert!(!node.handle(&heavy, t0()));
    assert!(node.accumulator.was_last_txn_gas_throttled());

    node.accumulator.leak_unused_gas_previously_reserved(PAYER, 1_000_000);
    assert!(node.handle(&heavy, t0()));
}
