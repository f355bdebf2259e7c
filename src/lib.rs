// Core types
pub mod config;
pub mod error;
pub mod tenant;

// Pool backends and the tenant registry
pub mod pool;
pub mod registry;

// Application layer
pub mod api;
pub mod gateway;
pub mod server;

// Supporting modules
pub mod metrics;
pub mod telemetry;
