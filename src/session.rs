//! Stream Session (§4.8): one task per downstream subscriber. Owns its own
//! upstream connection; reads raw ledgers in order, runs them through the
//! Ledger Processor, and forwards matching events to a bounded outbound
//! channel, suspending cooperatively at every cancellation point.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::cancel::CancelToken;
use crate::codec::Codec;
use crate::metrics::MetricsRegistry;
use crate::model::{Event, FilterSpec};
use crate::processor::{LedgerProcessor, ProcessorError};
use crate::upstream::{UpstreamError, UpstreamSource};

/// Recommended in §5: a timeout writing a single event to the subscriber
/// sink is a subscriber-side failure and terminates only that session.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("upstream transport failed: {0}")]
    UpstreamTransport(#[source] UpstreamError),
    #[error("timed out sending event to subscriber")]
    SendTimeout,
}

/// How the session's loop ended, distinct from `SessionError`: neither
/// variant is an error (§4.8 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The requested range was fully covered, or the subscriber/cancel
    /// token ended the session deliberately.
    Completed,
    /// Upstream reached EOF before an open-ended (or not-yet-covered)
    /// request was satisfied.
    UpstreamEnded,
}

pub struct StreamSession<U: UpstreamSource> {
    upstream: U,
    codec: Arc<dyn Codec>,
    processor: Arc<LedgerProcessor>,
    metrics: Arc<MetricsRegistry>,
    cancel: CancelToken,
}

impl<U: UpstreamSource> StreamSession<U> {
    pub fn new(
        upstream: U,
        codec: Arc<dyn Codec>,
        processor: Arc<LedgerProcessor>,
        metrics: Arc<MetricsRegistry>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            upstream,
            codec,
            processor,
            metrics,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// `Stream(ctx, FilterSpec, outbound) -> error` (§4.8).
    pub async fn run(
        mut self,
        filter: FilterSpec,
        outbound: mpsc::Sender<Event>,
    ) -> Result<SessionOutcome, SessionError> {
        self.metrics.session_opened();
        let outcome = self.run_inner(&filter, &outbound).await;
        self.metrics.session_closed();
        outcome
    }

    async fn run_inner(
        &mut self,
        filter: &FilterSpec,
        outbound: &mpsc::Sender<Event>,
    ) -> Result<SessionOutcome, SessionError> {
        let mut last_processed_sequence = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(SessionOutcome::Completed);
            }

            let raw = match self.upstream.next().await {
                None => {
                    return Ok(end_of_upstream(filter, last_processed_sequence));
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "upstream transport failed");
                    return Err(SessionError::UpstreamTransport(e));
                }
                Some(Ok(raw)) => raw,
            };

            if filter.end_ledger > 0 && raw.sequence > filter.end_ledger {
                return Ok(SessionOutcome::Completed);
            }

            match self
                .processor
                .process_ledger(&raw, self.codec.as_ref(), filter, &self.cancel)
            {
                Ok(events) => {
                    for event in events {
                        if self.cancel.is_cancelled() {
                            return Ok(SessionOutcome::Completed);
                        }
                        match timeout(SEND_TIMEOUT, outbound.send(event)).await {
                            Ok(Ok(())) => {}
                            Ok(Err(_)) => {
                                // Subscriber dropped its receiver; nothing
                                // left to do but end this session cleanly.
                                return Ok(SessionOutcome::Completed);
                            }
                            Err(_) => return Err(SessionError::SendTimeout),
                        }
                    }
                }
                Err(ProcessorError::DecodeFailed { sequence, source }) => {
                    tracing::error!(ledger = sequence, error = %source, "ledger decode failed, skipping");
                }
            }

            last_processed_sequence = raw.sequence;
        }
    }
}

fn end_of_upstream(filter: &FilterSpec, last_processed_sequence: u32) -> SessionOutcome {
    if filter.end_ledger != 0 && last_processed_sequence >= filter.end_ledger {
        SessionOutcome::Completed
    } else {
        SessionOutcome::UpstreamEnded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use crate::model::{Ledger, RawLedger};
    use crate::protocol23::FeatureGate;
    use crate::upstream::InMemoryUpstream;

    struct EmptyLedgerCodec;
    impl Codec for EmptyLedgerCodec {
        fn decode(&self, raw: &RawLedger) -> Result<Ledger, CodecError> {
            Ok(Ledger {
                sequence: raw.sequence,
                close_time: 0,
                protocol_version: 23,
                transactions: Vec::new(),
            })
        }
    }

    fn session(
        upstream: InMemoryUpstream,
    ) -> StreamSession<InMemoryUpstream> {
        StreamSession::new(
            upstream,
            Arc::new(EmptyLedgerCodec),
            Arc::new(LedgerProcessor::new(FeatureGate::new(23), Arc::new(MetricsRegistry::new()))),
            Arc::new(MetricsRegistry::new()),
            CancelToken::new(),
        )
    }

    #[tokio::test]
    async fn open_ended_request_reports_upstream_ended() {
        let upstream = InMemoryUpstream::from_sequences(0, [1, 2, 3]);
        let (tx, mut rx) = mpsc::channel(16);
        let outcome = session(upstream).run(FilterSpec::all_pass(), tx).await.unwrap();
        assert_eq!(outcome, SessionOutcome::UpstreamEnded);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn bounded_request_fully_covered_completes() {
        let upstream = InMemoryUpstream::from_sequences(0, [1, 2, 3]);
        let mut filter = FilterSpec::all_pass();
        filter.end_ledger = 3;
        let (tx, _rx) = mpsc::channel(16);
        let outcome = session(upstream).run(filter, tx).await.unwrap();
        assert_eq!(outcome, SessionOutcome::Completed);
    }

    #[tokio::test]
    async fn cancellation_ends_session_promptly() {
        let upstream = InMemoryUpstream::from_sequences(0, [1, 2, 3, 4, 5]);
        let (tx, _rx) = mpsc::channel(16);
        let sess = session(upstream);
        sess.cancel_token().cancel();
        let outcome = sess.run(FilterSpec::all_pass(), tx).await.unwrap();
        assert_eq!(outcome, SessionOutcome::Completed);
    }
}
