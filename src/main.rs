use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;

use stellar_invocation_stream::api;
use stellar_invocation_stream::codec::xdr::XdrCodec;
use stellar_invocation_stream::config::Config;
use stellar_invocation_stream::control_plane::{
    run_heartbeat, ControlPlaneSink, HttpControlPlaneSink, NoopControlPlaneSink,
};
use stellar_invocation_stream::error::ServiceError;
use stellar_invocation_stream::metrics::MetricsRegistry;
use stellar_invocation_stream::processor::LedgerProcessor;
use stellar_invocation_stream::protocol23::FeatureGate;
use stellar_invocation_stream::upstream::{InMemoryUpstream, UpstreamFactory, UpstreamSource};
use stellar_invocation_stream::AppState;

/// Wraps `InMemoryUpstream` behind the `UpstreamFactory` boundary. A real
/// network-backed upstream is a non-goal (§6); this demo factory hands
/// every session an already-exhausted queue, which is enough to exercise
/// the downstream transport end to end.
struct DemoUpstreamFactory;

impl UpstreamFactory for DemoUpstreamFactory {
    fn open(&self, start_ledger: u32) -> Box<dyn UpstreamSource> {
        Box::new(InMemoryUpstream::from_sequences(start_ledger, []))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        let e = ServiceError::from(e);
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(e.exit_code());
    }

    if let Err(e) = tokio::net::TcpStream::connect(&config.upstream_address).await {
        let e = ServiceError::UpstreamStartup(e.to_string());
        tracing::error!(error = %e, "failed to reach upstream at startup");
        std::process::exit(e.exit_code());
    }
    tracing::info!(upstream = %config.upstream_address, "upstream reachable");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| {
            tracing::warn!(error = %e, "failed to install prometheus recorder");
            e
        })
        .ok();

    let metrics = Arc::new(MetricsRegistry::new());
    let feature_gate = FeatureGate::new(config.protocol_23_activation_ledger);
    let processor = Arc::new(LedgerProcessor::new(feature_gate, Arc::clone(&metrics)));

    let state = Arc::new(AppState {
        codec: Arc::new(XdrCodec::new()),
        processor,
        metrics: Arc::clone(&metrics),
        upstream_factory: Arc::new(DemoUpstreamFactory),
    });

    if config.control_plane_enabled {
        let endpoint = config
            .control_plane_endpoint
            .clone()
            .expect("validated non-empty above");
        let sink: Arc<dyn ControlPlaneSink> = Arc::new(HttpControlPlaneSink::new(endpoint));
        let heartbeat_metrics = Arc::clone(&metrics);
        let interval = Duration::from_secs(config.control_plane_heartbeat_seconds);
        tokio::spawn(async move {
            run_heartbeat(sink, heartbeat_metrics, interval).await;
        });
    } else {
        tracing::debug!("control plane heartbeat disabled, using no-op sink");
        let _ = NoopControlPlaneSink;
    }

    let stream_app = api::router(Arc::clone(&state));
    let stream_addr: SocketAddr = format!("0.0.0.0:{}", config.listen_port).parse()?;
    let health_app = api::health_router(state, prometheus_handle);
    let health_addr: SocketAddr = format!("0.0.0.0:{}", config.health_port).parse()?;

    tracing::info!(address = %stream_addr, "starting streaming server");
    tracing::info!(address = %health_addr, "starting health server");

    let stream_listener = tokio::net::TcpListener::bind(stream_addr).await?;
    let health_listener = tokio::net::TcpListener::bind(health_addr).await?;

    tokio::try_join!(
        async { axum::serve(stream_listener, stream_app).await },
        async { axum::serve(health_listener, health_app).await },
    )?;

    Ok(())
}
