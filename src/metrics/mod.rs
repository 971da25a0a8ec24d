//! Metrics and monitoring for the scrim-room matchmaking service
//!
//! This module provides Prometheus metrics collection and the HTTP health
//! endpoints for the matchmaking service.

pub mod collector;
pub mod health;

pub use collector::{
    MetricsCollector, PerformanceMetrics, QueueMetrics, ScrimMetrics, ServiceMetrics,
};
pub use health::{HealthServer, HealthServerConfig};
