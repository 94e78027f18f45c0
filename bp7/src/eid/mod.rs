/*!
Endpoint Identifiers: the `dtn:` and `ipn:` URI schemes used to name bundle
sources, destinations, and report-to endpoints.
*/

use super::*;
use alloc::string::{String, ToString};

mod error;
mod parse;

#[cfg(test)]
mod str_tests;

#[cfg(test)]
mod cbor_tests;

pub use error::EidError;

/// An endpoint identifier, in one of the two schemes BPv7 defines.
#[derive(Default, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Eid {
    /// `dtn:none`, the null endpoint. CBOR `[1, 0]`.
    #[default]
    Null,
    /// `dtn://<node>/<demux>`. `ssp` is the URI's scheme-specific part
    /// verbatim, e.g. `"//node2/inbox"`. CBOR `[1, ssp]`.
    Dtn { ssp: String },
    /// `ipn:<node>.<service>`. CBOR `[2, [node, service]]`.
    Ipn { node: u64, service: u64 },
}

impl cbor::encode::ToCbor for Eid {
    type Result = ();

    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) -> Self::Result {
        encoder.emit_array(Some(2), |a| match self {
            Eid::Null => {
                a.emit(&1u64);
                a.emit(&0u64);
            }
            Eid::Dtn { ssp } => {
                a.emit(&1u64);
                a.emit(ssp);
            }
            Eid::Ipn { node, service } => {
                a.emit(&2u64);
                a.emit_array(Some(2), |a| {
                    a.emit(node);
                    a.emit(service);
                });
            }
        })
    }
}

impl cbor::decode::FromCbor for Eid {
    type Error = EidError;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        parse::eid_from_cbor(data)
    }
}

impl core::str::FromStr for Eid {
    type Err = EidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::eid_from_str(s)
    }
}

impl core::fmt::Display for Eid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Eid::Null => f.write_str("dtn:none"),
            Eid::Dtn { ssp } => write!(f, "dtn:{ssp}"),
            Eid::Ipn { node, service } => write!(f, "ipn:{node}.{service}"),
        }
    }
}
