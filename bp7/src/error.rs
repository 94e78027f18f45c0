/*!
This module defines the primary error type for the `bp7` crate.

The `Error` enum covers a wide range of issues that can occur during bundle
processing, from parsing errors to semantic validation failures. Decoding is
all-or-nothing: a bundle either decodes into a fully validated value or the
caller sees one of these errors, never a partially-built one.
*/

use super::*;
use thiserror::Error;

/// The primary error type for the `bp7` crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The outer bundle is not a CBOR array, is empty, or has no primary block.
    #[error("bundle is not a valid CBOR array, or is missing its primary block")]
    InvalidBundle,

    /// The primary block declares a version other than 7.
    #[error("unsupported bundle protocol version {0}")]
    InvalidVersion(u64),

    /// The is-fragment flag and the fragment offset/length tuple disagree.
    #[error("invalid fragment information: offset {0}, total length {1}")]
    InvalidFragmentInfo(u64, u64),

    /// A combination of bundle processing control flags violates RFC 9171 §4.2.3.
    #[error("invalid bundle or block flag combination")]
    InvalidFlags,

    /// A canonical block's inner data does not decode to the shape its block type requires.
    #[error("block {0} has an invalid shape for block type {1:?}")]
    InvalidCanonicalBlock(u64, block::Type),

    /// Block number 1 is reserved for the payload block, and only for it.
    #[error("{1:?} block cannot be block number {0}")]
    InvalidBlockNumber(u64, block::Type),

    /// Two canonical blocks in the same bundle share a block number.
    #[error("bundle has more than one block with block number {0}")]
    DuplicateBlockNumber(u64),

    /// The bundle has no block of type 1 (payload).
    #[error("bundle has no payload block")]
    MissingPayloadBlock,

    /// A block number referenced elsewhere (e.g. a BIB security target) does not exist.
    #[error("bundle does not contain block {0}")]
    MissingBlock(u64),

    /// A builder's `build()` was called before a required field was set.
    #[error("required field not set before build: {0}")]
    BuilderIncomplete(&'static str),

    /// An error related to BPSec processing.
    #[error(transparent)]
    InvalidBPSec(#[from] bpsec::Error),

    /// An error related to CRC processing.
    #[error(transparent)]
    InvalidCrc(#[from] crc::Error),

    /// An error related to Endpoint ID processing.
    #[error(transparent)]
    InvalidEid(#[from] eid::EidError),

    /// An error related to CBOR decoding.
    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),

    /// A generic error for when parsing a specific field fails.
    #[error("failed to parse {field}: {source}")]
    InvalidField {
        /// The name of the field that failed to parse.
        field: &'static str,
        /// The underlying error that caused the failure.
        source: alloc::boxed::Box<dyn core::error::Error + Send + Sync>,
    },
}

/// Trait for error types that can represent an invalid field error.
///
/// Implement this trait for error types that have an `InvalidField` variant
/// to enable use of the [`CaptureFieldErr`] extension trait.
pub trait HasInvalidField: Sized {
    /// Creates an invalid field error with the given field name and source error.
    fn invalid_field(
        field: &'static str,
        source: alloc::boxed::Box<dyn core::error::Error + Send + Sync>,
    ) -> Self;
}

impl HasInvalidField for Error {
    fn invalid_field(
        field: &'static str,
        source: alloc::boxed::Box<dyn core::error::Error + Send + Sync>,
    ) -> Self {
        Error::InvalidField { field, source }
    }
}

/// Extension trait for `Result` that maps errors to an `InvalidField` variant.
///
/// This is useful for providing more context when a parsing error occurs.
/// The error type `E` is specified on the method, allowing turbofish syntax
/// (`.map_field_err::<Error>("field")`) when type inference is insufficient.
pub trait CaptureFieldErr<T> {
    /// Maps the error to an `InvalidField` error with the given field name.
    fn map_field_err<E: HasInvalidField>(self, field: &'static str) -> Result<T, E>;
}

impl<T, Err> CaptureFieldErr<T> for Result<T, Err>
where
    Err: Into<alloc::boxed::Box<dyn core::error::Error + Send + Sync>>,
{
    fn map_field_err<E: HasInvalidField>(self, field: &'static str) -> Result<T, E> {
        self.map_err(|e| E::invalid_field(field, e.into()))
    }
}
