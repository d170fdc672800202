//! tollgate-services: the admission-control and congestion-pricing engine.
//! Throttles, the registry that compiles them from definitions, the
//! per-node accumulator, and the congestion multiplier sources.

pub mod accumulator;
pub mod bucket_compiler;
pub mod bucket_throttle;
pub mod error;
pub mod gate;
pub mod multiplier;
pub mod registry;
pub mod sources;
pub mod usage;

pub use accumulator::ThrottleAccumulator;
pub use bucket_compiler::{compile_bucket, CompiledBucket};
pub use bucket_throttle::{BucketThrottle, MILLI_UNITS_PER_OP};
pub use error::ThrottleConfigError;
pub use gate::{GateMember, ThrottleGate};
pub use multiplier::{CongestionLevelStarts, CongestionMultiplierSource, MultiplierReader, MultiplierSettings};
pub use registry::ThrottleRegistry;
pub use sources::{MultiplierReaders, MultiplierSnapshot, MultiplierSources};
pub use usage::TxnUsage;
