use super::*;
use thiserror::Error;

/// Errors arising from BPSec Block Integrity Block processing.
#[derive(Error, Debug)]
pub enum Error {
    /// A declared security target block number does not exist in the bundle.
    #[error("security target block {0} is not present in the bundle")]
    MissingSecurityTarget(u64),

    /// `seal` or `verify` was called on a BIB with no declared targets.
    #[error("integrity block has no security targets")]
    NoTargets,

    /// The security-results array length does not match the targets array length.
    #[error("security results count does not match security targets count")]
    MismatchedResults,

    /// HMAC verification failed for at least one target.
    #[error("integrity check failed")]
    IntegrityMismatch,

    /// `shaVariant` was not one of {5, 6, 7}.
    #[error("unsupported SHA variant {0}")]
    UnsupportedShaVariant(u64),

    /// The security context is not BIB-HMAC-SHA2 (context id 1).
    #[error("unrecognised BPSec security context {0}")]
    UnrecognisedContext(u64),

    /// A context parameter id outside {1, 2, 3}.
    #[error("invalid security context parameter id {0}")]
    InvalidContextParameter(u64),

    /// A security result id other than 1 (HMAC result).
    #[error("invalid security context result id {0}")]
    InvalidContextResult(u64),

    /// `securityContextFlags` bit 0 claims parameters are present, but none follow.
    #[error("missing security context parameters")]
    MissingContextParameters,

    /// Failed to parse a specific field while decoding a BIB body.
    #[error("failed to parse {field}: {source}")]
    InvalidField {
        field: &'static str,
        source: Box<dyn core::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),
}

pub trait CaptureFieldErr<T> {
    fn map_field_err(self, field: &'static str) -> Result<T, Error>;
}

impl<T, E: Into<Box<dyn core::error::Error + Send + Sync>>> CaptureFieldErr<T>
    for core::result::Result<T, E>
{
    fn map_field_err(self, field: &'static str) -> Result<T, Error> {
        self.map_err(|e| Error::InvalidField {
            field,
            source: e.into(),
        })
    }
}
