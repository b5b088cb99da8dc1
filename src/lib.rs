//! Validation and dispatch gateway for the STV model-checking engine.
//!
//! Clients submit a tagged JSON [`action::Action`]. The gateway checks every
//! numeric parameter and input file against the configured
//! [`config::ServiceLimits`], translates the action into an engine argument
//! vector with [`dispatch::translate`], and runs the engine under a wall-clock
//! ceiling through [`engine::EngineGateway`]. Failures surface as a single
//! [`error::StructuredError`] record.

pub mod action;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod server;
pub mod validation;
