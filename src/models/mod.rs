//! Models Module - Data Structures & Configuration
//!
//! Request and verdict types, relay messages, settings and errors.

pub mod config;
pub mod errors;
pub mod messages;
pub mod types;

pub use config::*;
pub use errors::*;
pub use messages::*;
pub use types::*;
