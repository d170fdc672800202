use crate::*;

/// A node that restarts from a saved snapshot prices exactly like one that
/// never stopped.
#[test]
fn test_restored_node_matches_uninterrupted_node() {
    let config = test_config();
    let mut steady = Node::new(3, &config).unwrap();
    let mut restarting = Node::new(3, &config).unwrap();

    // Saturate the gas throttle so its source starts dwelling.
    let call = TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1_990_000);
    assert!(steady.handle(&call, t0()));
    assert!(restarting.handle(&call, t0()));

    // Persist, then come back up with empty sources.
    let saved = serde_json::to_string(&restarting.sources.snapshot()).unwrap();
    restarting.sources = MultiplierSources::from_config(&config.fees).unwrap();
    restarting
        .sources
        .restore(&serde_json::from_str(&saved).unwrap());
    restarting.sources.reset_expectations();

    let gas_starts = steady.sources.gas_congestion_starts();
    assert!(gas_starts.iter().all(Option::is_some));
    assert_eq!(restarting.sources.gas_congestion_starts(), gas_starts);

    for secs in [0, 4, 5, 6, 30] {
        let now = t0().plus_secs(secs);
        assert_eq!(
            restarting.sources.current_multiplier(OperationTag::ContractCall, now),
            steady.sources.current_multiplier(OperationTag::ContractCall, now),
            "multiplier diverged {secs}s after restart"
        );
    }
    assert_eq!(
        steady.sources.current_multiplier(OperationTag::ContractCall, t0().plus_secs(5)),
        100
    );
}

/// Without the snapshot, the restarted node would price lower: the dwell
/// clock starts over.
#[test]
fn test_lost_snapshot_resets_dwell() {
    let config = test_config();
    let mut node = Node::new(3, &config).unwrap();
    let call = TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1_990_000);
    assert!(node.handle(&call, t0()));

    let mut fresh = MultiplierSources::from_config(&config.fees).unwrap();
    fresh.update_multiplier(&node.accumulator, t0().plus_secs(3));
    let now = t0().plus_secs(5);
    assert_eq!(node.sources.current_multiplier(OperationTag::ContractCall, now), 100);
    assert_eq!(fresh.current_multiplier(OperationTag::ContractCall, now), 1);
}
