//! Common library for the bus position simulator.
//!
//! This crate provides shared functionality for the bus-tracker services,
//! including configuration management, error handling, telemetry utilities,
//! the route and position data model, and a small Firebase Realtime Database
//! client authenticated with a service account.

// Configuration management
pub mod config;
pub use config::Config;

// Error handling types
pub mod error;
pub use error::{BusError, Result};

// Telemetry and observability
pub mod telemetry;

// Route geometry and published position records
pub mod position;
pub mod route;
pub use position::PositionRecord;
pub use route::Route;

// Firebase Realtime Database access
pub mod firebase;

pub use telemetry::init_tracing;
