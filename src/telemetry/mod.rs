//! Telemetry module
//!
//! Structured logging and metrics

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{increment, record_latency, set_in_flight, CounterMetric, LatencyMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Initialize all telemetry subsystems
///
/// The Prometheus exporter spawns onto the current tokio runtime, so this
/// must run inside one when `metrics_port` is set.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
        tracing::info!(%addr, "Prometheus metrics exporter listening");
    }

    Ok(())
}
