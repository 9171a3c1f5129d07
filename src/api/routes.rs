use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::Stream;

use crate::cancel::CancelToken;
use crate::model::FilterSpec;
use crate::session::StreamSession;
use crate::AppState;

use super::types::HealthResponse;

/// `GET /health`.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse::from(state.metrics.snapshot()))
}

/// `POST /v1/contract-invocations`: the one streaming RPC (§4.8, §4.10),
/// concretized as Server-Sent Events. The request body is a JSON-encoded
/// `FilterSpec`; the response is one JSON `Event` per SSE frame, in the
/// order the Ledger Processor emits them.
pub async fn stream_contract_invocations(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<FilterSpec>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let upstream = state.upstream_factory.open(filter.start_ledger);
    let cancel = CancelToken::new();
    let session = StreamSession::new(
        upstream,
        Arc::clone(&state.codec),
        Arc::clone(&state.processor),
        Arc::clone(&state.metrics),
        cancel,
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel(256);
    tokio::spawn(async move {
        match session.run(filter, tx).await {
            Ok(outcome) => tracing::info!(?outcome, "stream session ended"),
            Err(e) => tracing::warn!(error = %e, "stream session ended with error"),
        }
    });

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok(SseEvent::default().event("contract-invocation").data(json)),
                Err(e) => tracing::error!(error = %e, "failed to serialize event"),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
