//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the scrim-room matchmaking
//! service using Prometheus metrics.

use crate::scrim::manager::ScrimManagerStats;
use crate::types::{Region, Side};
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue-related metrics
    queue_metrics: QueueMetrics,

    /// Scrim-related metrics
    scrim_metrics: ScrimMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Join attempts by outcome
    pub joins_total: IntCounterVec,

    /// Leave requests by outcome
    pub leaves_total: IntCounterVec,

    /// Candidates currently queued per region
    pub queue_size: IntGaugeVec,
}

/// Scrim-related metrics
#[derive(Clone)]
pub struct ScrimMetrics {
    /// Scrims created by allocation method
    pub scrims_created_total: IntCounterVec,

    /// Scrims completed by winning side
    pub scrims_completed_total: IntCounterVec,

    /// Scrims started and not yet completed
    pub active_scrims: IntGauge,

    /// Rating difference of created matchups
    pub rating_difference: Histogram,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent in the allocation pipeline
    pub matchmaking_duration: Histogram,

    /// Failed chat or persistence calls
    pub gateway_failures_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let scrim_metrics = ScrimMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            scrim_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    pub fn scrim(&self) -> &ScrimMetrics {
        &self.scrim_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Refresh gauges from scrim manager stats
    pub fn update_from_scrim_stats(&self, stats: &ScrimManagerStats) {
        self.scrim_metrics
            .active_scrims
            .set(stats.active_scrims as i64);
    }

    /// Record a queue join attempt; `outcome` is "joined" or an error kind
    pub fn record_queue_join(&self, outcome: &str) {
        self.queue_metrics
            .joins_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_queue_leave(&self, outcome: &str) {
        self.queue_metrics
            .leaves_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn set_queue_size(&self, region: Region, size: usize) {
        self.queue_metrics
            .queue_size
            .with_label_values(&[&region.to_string()])
            .set(size as i64);
    }

    /// Record a scrim being formed
    pub fn record_scrim_created(&self, random_fallback: bool, rating_difference: i32) {
        let method = if random_fallback { "random" } else { "balanced" };

        self.scrim_metrics
            .scrims_created_total
            .with_label_values(&[method])
            .inc();
        self.scrim_metrics.active_scrims.inc();
        self.scrim_metrics
            .rating_difference
            .observe(rating_difference as f64);
    }

    /// Record a winner report
    pub fn record_scrim_completed(&self, winner: Side) {
        self.scrim_metrics
            .scrims_completed_total
            .with_label_values(&[&winner.to_string()])
            .inc();
        self.scrim_metrics.active_scrims.dec();
    }

    pub fn record_matchmaking(&self, duration: Duration) {
        self.performance_metrics
            .matchmaking_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a failed best-effort gateway call
    pub fn record_gateway_failure(&self, operation: &str) {
        self.performance_metrics
            .gateway_failures_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("scrim_room_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "scrim_room_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("scrim_room_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let joins_total = IntCounterVec::new(
            Opts::new("scrim_room_queue_joins_total", "Queue join attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(joins_total.clone()))?;

        let leaves_total = IntCounterVec::new(
            Opts::new("scrim_room_queue_leaves_total", "Queue leave requests"),
            &["outcome"],
        )?;
        registry.register(Box::new(leaves_total.clone()))?;

        let queue_size = IntGaugeVec::new(
            Opts::new("scrim_room_queue_size", "Candidates currently queued"),
            &["region"],
        )?;
        registry.register(Box::new(queue_size.clone()))?;

        Ok(Self {
            joins_total,
            leaves_total,
            queue_size,
        })
    }
}

impl ScrimMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let scrims_created_total = IntCounterVec::new(
            Opts::new("scrim_room_scrims_created_total", "Total scrims created"),
            &["method"],
        )?;
        registry.register(Box::new(scrims_created_total.clone()))?;

        let scrims_completed_total = IntCounterVec::new(
            Opts::new("scrim_room_scrims_completed_total", "Total scrims completed"),
            &["winner"],
        )?;
        registry.register(Box::new(scrims_completed_total.clone()))?;

        let active_scrims = IntGauge::new("scrim_room_active_scrims", "Scrims in progress")?;
        registry.register(Box::new(active_scrims.clone()))?;

        let rating_difference = Histogram::with_opts(
            HistogramOpts::new(
                "scrim_room_rating_difference",
                "Rating difference of created matchups",
            )
            .buckets(vec![0.0, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0]),
        )?;
        registry.register(Box::new(rating_difference.clone()))?;

        Ok(Self {
            scrims_created_total,
            scrims_completed_total,
            active_scrims,
            rating_difference,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matchmaking_duration = Histogram::with_opts(
            HistogramOpts::new(
                "scrim_room_matchmaking_duration_seconds",
                "Allocation pipeline time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        )?;
        registry.register(Box::new(matchmaking_duration.clone()))?;

        let gateway_failures_total = IntCounterVec::new(
            Opts::new(
                "scrim_room_gateway_failures_total",
                "Failed gateway operations",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(gateway_failures_total.clone()))?;

        Ok(Self {
            matchmaking_duration,
            gateway_failures_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
