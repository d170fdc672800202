//! Already-estimated facts about one transaction, as far as throttling cares.

use tollgate_core::OperationTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnUsage {
    pub operation: OperationTag,
    /// Account number of the paying account.
    pub payer: u64,
    /// Gas the transaction may consume; only read for gas-metered operations.
    pub gas_limit: u64,
    /// Serials minted by a `TokenMint` of a non-fungible token; zero for a
    /// fungible mint.
    pub nft_count: u32,
    /// Accounts the transaction would create implicitly.
    pub implicit_creations: u32,
}

impl TxnUsage {
    pub fn new(operation: OperationTag, payer: u64) -> Self {
        Self {
            operation,
            payer,
            gas_limit: 0,
            nft_count: 0,
            implicit_creations: 0,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_nft_count(mut self, nft_count: u32) -> Self {
        self.nft_count = nft_count;
        self
    }

    pub fn with_implicit_creations(mut self, implicit_creations: u32) -> Self {
        self.implicit_creations = implicit_creations;
        self
    }
}
