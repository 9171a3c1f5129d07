//! Upstream Source (§6, consumed): a streaming interface yielding raw
//! ledgers in ascending sequence order. Reading ledgers from network or
//! storage is a non-goal; this module defines the trait boundary plus an
//! in-memory implementation for tests and local demos.

use std::collections::VecDeque;

use thiserror::Error;

use crate::model::RawLedger;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream connection lost: {0}")]
    ConnectionLost(String),
}

/// Yields raw ledgers in ascending sequence order until exhausted.
/// `next` returning `None` signals a clean EOF (§4.8 step 6,
/// `UpstreamEnded`); `Some(Err(_))` signals a transport failure that must
/// terminate the owning session (§7 "Upstream transport error").
#[async_trait::async_trait]
pub trait UpstreamSource: Send {
    async fn next(&mut self) -> Option<Result<RawLedger, UpstreamError>>;
}

/// Test/demo source backed by a fixed, in-memory queue of ledgers.
pub struct InMemoryUpstream {
    queue: VecDeque<RawLedger>,
}

impl InMemoryUpstream {
    pub fn new(ledgers: impl IntoIterator<Item = RawLedger>) -> Self {
        Self {
            queue: ledgers.into_iter().collect(),
        }
    }

    pub fn from_sequences(start_ledger: u32, sequences: impl IntoIterator<Item = u32>) -> Self {
        Self::new(
            sequences
                .into_iter()
                .filter(|&seq| seq >= start_ledger)
                .map(|seq| RawLedger {
                    sequence: seq,
                    bytes: Vec::new(),
                }),
        )
    }
}

#[async_trait::async_trait]
impl UpstreamSource for InMemoryUpstream {
    async fn next(&mut self) -> Option<Result<RawLedger, UpstreamError>> {
        self.queue.pop_front().map(Ok)
    }
}

/// Opens a fresh upstream connection scoped to one subscriber's request.
/// Each `Stream` RPC call (§4.8) owns its own upstream connection, so the
/// downstream transport needs a way to mint one per request rather than
/// sharing a single `UpstreamSource`.
pub trait UpstreamFactory: Send + Sync {
    fn open(&self, start_ledger: u32) -> Box<dyn UpstreamSource>;
}

#[async_trait::async_trait]
impl UpstreamSource for Box<dyn UpstreamSource> {
    async fn next(&mut self) -> Option<Result<RawLedger, UpstreamError>> {
        (**self).next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_ledgers_in_order_then_ends() {
        let mut upstream = InMemoryUpstream::from_sequences(0, [1, 2, 3]);
        assert_eq!(upstream.next().await.unwrap().unwrap().sequence, 1);
        assert_eq!(upstream.next().await.unwrap().unwrap().sequence, 2);
        assert_eq!(upstream.next().await.unwrap().unwrap().sequence, 3);
        assert!(upstream.next().await.is_none());
    }

    #[tokio::test]
    async fn filters_sequences_below_start_ledger() {
        let mut upstream = InMemoryUpstream::from_sequences(2, [1, 2, 3]);
        assert_eq!(upstream.next().await.unwrap().unwrap().sequence, 2);
        assert_eq!(upstream.next().await.unwrap().unwrap().sequence, 3);
        assert!(upstream.next().await.is_none());
    }
}
