use crate::*;

/// A node configured from TOML behaves per that file.
#[test]
fn test_node_from_toml_config() {
    let config = TollgateConfig::from_toml(
        r#"
        [throttling]
        max_gas_per_sec = 100
        last_throttle_exempt = 0

        [fees]
        gas_percent_congestion_multipliers = "50,3x"
        min_congestion_period_secs = 0
        "#,
    )
    .unwrap();
    config.validate().unwrap();
    let mut node = Node::new(1, &config).unwrap();

    // Account 1 is not exempt here.
    let call = TxnUsage::new(OperationTag::ContractCall, 1).with_gas_limit(60);
    assert!(node.handle(&call, t0()));
    assert!(!node.handle(&call, t0()));
    assert_eq!(node.sources.current_multiplier(OperationTag::ContractCall, t0()), 3);
    assert_eq!(node.sources.current_multiplier(OperationTag::TokenMint, t0()), 1);
}

/// Gas throttling switched on with no budget rejects all gas-metered work.
#[test]
fn test_zero_gas_budget() {
    let config = TollgateConfig::from_toml("[throttling]\nmax_gas_per_sec = 0\n").unwrap();
    let mut node = Node::new(1, &config).unwrap();
    assert!(node.accumulator.gas_limit_throttle().is_none());
    let call = TxnUsage::new(OperationTag::ContractCall, PAYER).with_gas_limit(1);
    assert!(!node.handle(&call, t0()));
    assert!(node.handle(&TxnUsage::new(OperationTag::CryptoTransfer, PAYER), t0()));
}
