//! Control plane (§6, §4.11): a black-box sink fed a `MetricsSnapshot` on
//! an interval. Registration/heartbeat fan-out to an orchestrator is a
//! non-goal; this module defines only the sink contract plus a no-op and
//! an HTTP implementation, grounded on the teacher's `sync.rs` background
//! `tokio::spawn` loop and `reqwest::Client` usage.

use std::time::Duration;

use async_trait::async_trait;

use crate::metrics::MetricsSnapshot;

#[async_trait]
pub trait ControlPlaneSink: Send + Sync {
    async fn report(&self, snapshot: MetricsSnapshot);
}

/// Default sink when no control plane is configured.
#[derive(Debug, Default)]
pub struct NoopControlPlaneSink;

#[async_trait]
impl ControlPlaneSink for NoopControlPlaneSink {
    async fn report(&self, _snapshot: MetricsSnapshot) {}
}

/// Posts each snapshot as JSON to a configured endpoint.
pub struct HttpControlPlaneSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpControlPlaneSink {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl ControlPlaneSink for HttpControlPlaneSink {
    #[tracing::instrument(skip(self, snapshot))]
    async fn report(&self, snapshot: MetricsSnapshot) {
        if let Err(e) = self
            .client
            .post(&self.endpoint)
            .json(&snapshot)
            .send()
            .await
        {
            tracing::warn!(error = %e, endpoint = %self.endpoint, "control-plane heartbeat failed");
        }
    }
}

/// Drives `sink.report(metrics.snapshot())` on a fixed interval until the
/// process shuts down. Mirrors the teacher's `run_sync` background-task
/// shape, generalized from a sync loop to a heartbeat loop.
pub async fn run_heartbeat(
    sink: std::sync::Arc<dyn ControlPlaneSink>,
    metrics: std::sync::Arc<crate::metrics::MetricsRegistry>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        sink.report(metrics.snapshot()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_sink_accepts_any_snapshot() {
        let sink = NoopControlPlaneSink;
        sink.report(MetricsSnapshot::default()).await;
    }
}
