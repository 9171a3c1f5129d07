use serde::Serialize;

use crate::metrics::MetricsSnapshot;

/// `GET /health` response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub last_processed_ledger: u32,
    pub active_sessions: u64,
}

impl From<MetricsSnapshot> for HealthResponse {
    fn from(snapshot: MetricsSnapshot) -> Self {
        HealthResponse {
            status: "ok",
            last_processed_ledger: snapshot.last_processed_ledger,
            active_sessions: snapshot.active_sessions,
        }
    }
}

/// Structured error body for `ApiError`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}
