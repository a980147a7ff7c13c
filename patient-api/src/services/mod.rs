//! Service layer
//!
//! Orchestration between the route handlers and the db/dialogue/provider
//! layers. Handlers stay thin; the lifecycle rules live here.

pub mod session;
pub mod turn;
pub mod visit;
