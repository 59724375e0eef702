//! HTTP route handlers.

pub mod applications;
pub mod health;
pub mod metrics;
