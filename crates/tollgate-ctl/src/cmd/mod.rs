//! CLI command modules.

pub mod check;
pub mod config;
pub mod simulate;
