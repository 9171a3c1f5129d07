pub mod api;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod control_plane;
pub mod error;
pub mod metrics;
pub mod model;
pub mod processor;
pub mod protocol23;
pub mod session;
pub mod upstream;
pub mod value;

use std::sync::Arc;

use codec::Codec;
use metrics::MetricsRegistry;
use processor::LedgerProcessor;
use upstream::UpstreamFactory;

/// Shared application state, handed to every request handler. Each
/// streaming request opens its own upstream connection via
/// `upstream_factory`; the codec, processor and metrics registry are
/// shared across all sessions.
pub struct AppState {
    pub codec: Arc<dyn Codec>,
    pub processor: Arc<LedgerProcessor>,
    pub metrics: Arc<MetricsRegistry>,
    pub upstream_factory: Arc<dyn UpstreamFactory>,
}
