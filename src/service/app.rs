//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the scrim manager
//! to its gateways, the health endpoints and the background tasks.

use crate::config::AppConfig;
use crate::gateway::{ChatGateway, InMemoryPersistence, LoggingChatGateway, PersistenceGateway};
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector};
use crate::scrim::ScrimManager;
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Scrim lifecycle manager; the command layer calls into this
    scrim_manager: Arc<ScrimManager>,

    /// Metrics shared by the manager and the health endpoints
    metrics_collector: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Stops the health server once it is running
    health_shutdown: Mutex<Option<broadcast::Sender<()>>>,

    /// Service status
    is_running: RwLock<bool>,
}

impl AppState {
    /// Initialize the application with in-process gateways
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let persistence = Arc::new(InMemoryPersistence::new());
        let chat = Arc::new(LoggingChatGateway::new(config.gateway.clone()));
        Self::with_gateways(config, persistence, chat).await
    }

    /// Initialize the application with the given gateways
    pub async fn with_gateways(
        config: AppConfig,
        persistence: Arc<dyn PersistenceGateway>,
        chat: Arc<dyn ChatGateway>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing scrim-room matchmaking service");
        info!(
            "Configuration: service={}, queue_expiry={}s, offrole_penalty={}, random_fallback={}",
            config.service.name,
            config.matchmaking.queue_expiry_seconds,
            config.matchmaking.offrole_penalty,
            config.matchmaking.random_fallback
        );

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );
        let scrim_manager = Arc::new(ScrimManager::with_metrics(
            &config,
            persistence,
            chat,
            metrics_collector.clone(),
        ));

        Ok(Self {
            config,
            scrim_manager,
            metrics_collector,
            background_tasks: Mutex::new(Vec::new()),
            health_shutdown: Mutex::new(None),
            is_running: RwLock::new(false),
        })
    }

    /// Start the health endpoints and background tasks
    pub async fn start(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting scrim-room matchmaking service");

        *self.is_running.write().await = true;

        self.start_health_server().await?;
        self.start_background_tasks().await?;

        info!("✅ Scrim-room matchmaking service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of scrim-room service");

        *self.is_running.write().await = false;

        if let Some(shutdown_tx) = self.health_shutdown.lock().await.take() {
            info!("Stopping health server...");
            if shutdown_tx.send(()).is_err() {
                warn!("Health server was already stopped");
            }
        }

        self.stop_background_tasks().await;

        let final_stats =
            self.scrim_manager
                .get_stats()
                .await
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("✅ Scrim-room service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the scrim manager for operations
    pub fn scrim_manager(&self) -> Arc<ScrimManager> {
        self.scrim_manager.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Serve the health endpoints in the background
    async fn start_health_server(self: &Arc<Self>) -> Result<(), ServiceError> {
        let port = self.config.service.health_port;
        info!("Starting metrics and health endpoints on port {}", port);

        let health_config = HealthServerConfig {
            port,
            host: "0.0.0.0".to_string(),
            service_name: self.config.service.name.clone(),
        };
        let health_server = HealthServer::new(health_config, self.metrics_collector.clone())
            .with_app_state(self.clone());
        *self.health_shutdown.lock().await = Some(health_server.shutdown_handle());

        let health_handle = tokio::spawn(async move {
            if let Err(e) = health_server.start().await {
                error!("Health server failed: {}", e);
            } else {
                info!("Health server task completed");
            }
        });
        self.background_tasks.lock().await.push(health_handle);

        // Give the server a moment to start up
        tokio::time::sleep(Duration::from_millis(100)).await;

        info!("✅ Health server started on port {}", port);
        Ok(())
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(self: &Arc<Self>) -> Result<(), ServiceError> {
        info!("Starting background maintenance tasks...");

        info!("Starting scrim metrics update task (30s interval)...");
        let metrics_task = {
            let app_state = self.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(30));
                info!("Metrics update task started");

                while app_state.is_running().await {
                    interval.tick().await;

                    let scrim_manager = app_state.scrim_manager();
                    match scrim_manager.get_stats().await {
                        Ok(stats) => {
                            let queued = scrim_manager.queues().total_queued().unwrap_or(0);
                            debug!(
                                "Updated metrics - active scrims: {}, queued: {}, created: {}",
                                stats.active_scrims, queued, stats.scrims_created
                            );
                        }
                        Err(e) => {
                            warn!("Failed to get scrim stats for metrics update: {}", e);
                        }
                    }
                }

                info!("Metrics update task stopped");
            })
        };

        info!("Starting health metrics task (60s interval)...");
        let health_metrics_task = {
            let app_state = self.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                let start_time = tokio::time::Instant::now();
                let metrics_collector = app_state.metrics_collector();
                info!("Health metrics task started");

                while app_state.is_running().await {
                    interval.tick().await;

                    let uptime_seconds = start_time.elapsed().as_secs() as i64;
                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(uptime_seconds);

                    metrics_collector.update_health_status(2);
                    metrics_collector.update_component_health("scrim_manager", true);
                    metrics_collector.update_component_health("queue_store", true);
                    metrics_collector.update_component_health("metrics", true);
                }

                info!("Health metrics task stopped");
            })
        };

        let mut tasks = self.background_tasks.lock().await;
        tasks.push(metrics_task);
        tasks.push(health_metrics_task);

        info!("2 background maintenance tasks started successfully");
        Ok(())
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&self) {
        let mut tasks = self.background_tasks.lock().await;
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
