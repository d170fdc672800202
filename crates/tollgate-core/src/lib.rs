//! tollgate-core: shared types for the admission-control and congestion
//! pricing engine. All other Tollgate crates depend on this one.

pub mod config;
pub mod definitions;
pub mod operation;
pub mod pricing;
pub mod time;

pub use config::{ConfigError, FeesConfig, ThrottlingConfig, TollgateConfig};
pub use definitions::{ThrottleBucketSpec, ThrottleDefinitions, ThrottleGroupSpec};
pub use operation::OperationTag;
pub use pricing::{CongestionTier, CongestionTiers, DeEscalation, ScaleFactor};
pub use time::ConsensusTime;
