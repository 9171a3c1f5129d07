pub mod xdr;

use thiserror::Error;

use crate::model::{Ledger, RawLedger};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("ledger {sequence}: failed to decode XDR: {source}")]
    Xdr {
        sequence: u32,
        #[source]
        source: stellar_xdr::curr::Error,
    },
    #[error("ledger {sequence}: empty or truncated input")]
    Empty { sequence: u32 },
}

/// Unmarshals raw ledger bytes into a typed `Ledger`. An assumed external
/// dependency per `spec.md` §1/§6 — this crate ships one concrete
/// implementation (`xdr::XdrCodec`) so it is runnable standalone.
pub trait Codec: Send + Sync {
    fn decode(&self, raw: &RawLedger) -> Result<Ledger, CodecError>;
}
