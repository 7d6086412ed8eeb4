//! Utils Module - Helper Functions & Shared Utilities

pub mod address;
pub mod constants;
pub mod decoder;

pub use address::*;
pub use constants::*;
pub use decoder::*;
