use alloc::boxed::Box;
use alloc::string::String;
use thiserror::Error;

/// Errors that can occur while parsing or decoding an [`super::Eid`].
#[derive(Error, Debug)]
pub enum EidError {
    #[error("dtn URI is missing its scheme separator ':'")]
    MissingScheme,

    #[error("dtn URI scheme-specific part is empty")]
    DtnSspEmpty,

    #[error("ipn URI must have the form 'ipn:<node>.<service>'")]
    InvalidIpnComponents,

    #[error("unsupported EID URI scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("unrecognised EID CBOR scheme {0}")]
    UnrecognisedScheme(u64),

    #[error("failed to parse {field}: {source}")]
    InvalidField {
        field: &'static str,
        source: Box<dyn core::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),
}

impl super::super::error::HasInvalidField for EidError {
    fn invalid_field(
        field: &'static str,
        source: Box<dyn core::error::Error + Send + Sync>,
    ) -> Self {
        EidError::InvalidField { field, source }
    }
}
