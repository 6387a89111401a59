//! Session - one bridge run from driver start to shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bridge::DriverNode;
use contracts::{BridgeConfig, Transport};
use sensor_sdk::MockSdk;
use tracing::{info, warn};

use super::stats::{SessionStats, StopReason};

/// How often the session checks its stop conditions
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Validated bridge configuration
    pub config: BridgeConfig,
    /// Stop after this many handled batches
    pub max_batches: Option<u64>,
    pub timeout: Option<Duration>,
    /// Progress logging period
    pub stats_interval: Option<Duration>,
    /// Prometheus exporter port
    pub metrics_port: Option<u16>,
}

/// Runs the driver node until a stop condition fires
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Start the node, wait for `shutdown`, the timeout or the batch limit,
    /// then stop the node and collect statistics.
    pub async fn run<F>(self, shutdown: F) -> Result<SessionStats>
    where
        F: Future<Output = ()>,
    {
        let SessionConfig {
            config,
            max_batches,
            timeout,
            stats_interval,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
        }

        let sdk = Arc::new(MockSdk::with_sensors(config.simulated_sensors.clone()));
        let transport = publisher::create_transport(&config.transport)
            .context("Failed to create output transport")?;
        let transport_name = transport.name().to_string();

        let started = Instant::now();
        let mut node = DriverNode::start(&config, sdk.clone(), transport)
            .context("Failed to start driver node")?;

        info!(
            sensors = config.simulated_sensors.len(),
            transport = %transport_name,
            combine_sensors = config.driver.combine_sensors,
            "Bridge running"
        );

        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(expired);

        let mut poll = tokio::time::interval(POLL_INTERVAL);
        let mut last_report = Instant::now();

        let reason = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping bridge...");
                    break StopReason::Signal;
                }
                _ = &mut expired => {
                    info!("Timeout reached");
                    break StopReason::Timeout;
                }
                _ = poll.tick() => {
                    let summary = node.processor().summary();

                    if let Some(limit) = max_batches {
                        if summary.total_batches >= limit {
                            info!(limit, "Batch limit reached");
                            break StopReason::MaxBatches;
                        }
                    }

                    if let Some(interval) = stats_interval {
                        if last_report.elapsed() >= interval {
                            last_report = Instant::now();
                            info!(
                                batches = summary.total_batches,
                                dropped = summary.dropped_batches,
                                messages = summary.messages_published,
                                failures = summary.publish_failures,
                                "Progress"
                            );
                        }
                    }
                }
            }
        };

        // Stopping joins the SDK's emitter threads
        let node = tokio::task::spawn_blocking(move || {
            node.stop();
            node
        })
        .await
        .context("Driver node stop task failed")?;

        Ok(SessionStats {
            duration: started.elapsed(),
            reason,
            transport: transport_name,
            sensors: config.simulated_sensors.len(),
            batches_delivered: sdk.batches_delivered(),
            node: node.stats(),
        })
    }
}
