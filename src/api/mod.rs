//! Wallet Guard HTTP API
//! Check, analyze and screen requests over REST

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
