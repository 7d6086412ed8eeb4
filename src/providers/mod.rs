//! Providers Module - External Data Sources
//!
//! JSON-RPC gas estimation.

pub mod gas_simulator;

pub use gas_simulator::*;
