//! Operation tags, the kinds of work a transaction or query can request.
//!
//! Tags are `Ord` so that every map keyed by them iterates in the same order
//! on every node.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationTag {
    CryptoTransfer,
    CryptoCreate,
    CryptoUpdate,
    CryptoDelete,
    CryptoApproveAllowance,
    CryptoGetAccountBalance,
    ContractCall,
    ContractCreate,
    ContractCallLocal,
    EthereumTransaction,
    TokenCreate,
    TokenMint,
    TokenBurn,
    TokenAssociateToAccount,
    ConsensusCreateTopic,
    ConsensusSubmitMessage,
    ScheduleCreate,
    ScheduleSign,
    FileCreate,
    FileUpdate,
    FileAppend,
    GetVersionInfo,
    TransactionGetReceipt,
    TransactionGetRecord,
}

impl OperationTag {
    pub const ALL: [OperationTag; 24] = [
        Self::CryptoTransfer,
        Self::CryptoCreate,
        Self::CryptoUpdate,
        Self::CryptoDelete,
        Self::CryptoApproveAllowance,
        Self::CryptoGetAccountBalance,
        Self::ContractCall,
        Self::ContractCreate,
        Self::ContractCallLocal,
        Self::EthereumTransaction,
        Self::TokenCreate,
        Self::TokenMint,
        Self::TokenBurn,
        Self::TokenAssociateToAccount,
        Self::ConsensusCreateTopic,
        Self::ConsensusSubmitMessage,
        Self::ScheduleCreate,
        Self::ScheduleSign,
        Self::FileCreate,
        Self::FileUpdate,
        Self::FileAppend,
        Self::GetVersionInfo,
        Self::TransactionGetReceipt,
        Self::TransactionGetRecord,
    ];

    /// Operations charged against the gas throttle in addition to their
    /// per-operation buckets.
    pub fn is_gas_metered(self) -> bool {
        matches!(
            self,
            Self::ContractCall | Self::ContractCreate | Self::EthereumTransaction
        )
    }

    /// Operations that may create accounts implicitly (alias transfers).
    pub fn may_auto_create(self) -> bool {
        matches!(self, Self::CryptoTransfer | Self::EthereumTransaction)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CryptoTransfer => "CryptoTransfer",
            Self::CryptoCreate => "CryptoCreate",
            Self::CryptoUpdate => "CryptoUpdate",
            Self::CryptoDelete => "CryptoDelete",
            Self::CryptoApproveAllowance => "CryptoApproveAllowance",
            Self::CryptoGetAccountBalance => "CryptoGetAccountBalance",
            Self::ContractCall => "ContractCall",
            Self::ContractCreate => "ContractCreate",
            Self::ContractCallLocal => "ContractCallLocal",
            Self::EthereumTransaction => "EthereumTransaction",
            Self::TokenCreate => "TokenCreate",
            Self::TokenMint => "TokenMint",
            Self::TokenBurn => "TokenBurn",
            Self::TokenAssociateToAccount => "TokenAssociateToAccount",
            Self::ConsensusCreateTopic => "ConsensusCreateTopic",
            Self::ConsensusSubmitMessage => "ConsensusSubmitMessage",
            Self::ScheduleCreate => "ScheduleCreate",
            Self::ScheduleSign => "ScheduleSign",
            Self::FileCreate => "FileCreate",
            Self::FileUpdate => "FileUpdate",
            Self::FileAppend => "FileAppend",
            Self::GetVersionInfo => "GetVersionInfo",
            Self::TransactionGetReceipt => "TransactionGetReceipt",
            Self::TransactionGetRecord => "TransactionGetRecord",
        }
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for OperationTag {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}
