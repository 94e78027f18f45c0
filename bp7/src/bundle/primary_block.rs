/*!
This internal module handles the parsing and emission of the BPv7 Primary
Block. Decoding produces a fully validated `PrimaryBlock` or fails outright;
there is no partially-decoded representation.
*/

use super::*;
use error::CaptureFieldErr;

/// The decoded fields of a BPv7 Primary Block, RFC 9171 §4.3.1.
pub struct PrimaryBlock {
    pub flags: bundle::BundleFlags,
    pub crc_type: crc::CrcType,
    pub source: eid::Eid,
    pub destination: eid::Eid,
    pub report_to: eid::Eid,
    pub timestamp: creation_timestamp::CreationTimestamp,
    pub lifetime: core::time::Duration,
    pub fragment_info: Option<bundle::FragmentInfo>,
}

impl cbor::decode::FromCbor for PrimaryBlock {
    type Error = Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse_array(data, |block, s, tags| {
            let mut shortest = s && tags.is_empty() && block.is_definite();

            let version = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("version")?;
            if version != 7 {
                return Err(Error::InvalidVersion(version));
            }

            let flags: bundle::BundleFlags = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("bundle processing control flags")?;

            let crc_type = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("CRC type")?;

            let destination = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("destination EID")?;

            let source = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("source EID")?;

            let report_to = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("report-to EID")?;

            let timestamp = block
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("creation timestamp")?;

            let lifetime = block
                .parse::<u64>()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    core::time::Duration::from_millis(v)
                })
                .map_field_err("lifetime")?;
            if lifetime.is_zero() {
                return Err(Error::InvalidField {
                    field: "lifetime",
                    source: "bundle lifetime must be non-zero".into(),
                });
            }

            let fragment_info = if !flags.is_fragment {
                None
            } else {
                let (offset, s1) = block.parse().map_field_err("fragment offset")?;
                let (total_adu_length, s2) =
                    block.parse().map_field_err("total application data unit length")?;
                if offset >= total_adu_length {
                    return Err(Error::InvalidFragmentInfo(offset, total_adu_length));
                }
                shortest = shortest && s1 && s2;
                Some(bundle::FragmentInfo {
                    offset,
                    total_adu_length,
                })
            };

            shortest = crc::parse_crc_value(data, block, crc_type)? && shortest;

            Ok((
                Self {
                    flags,
                    crc_type,
                    source,
                    destination,
                    report_to,
                    timestamp,
                    lifetime,
                    fragment_info,
                },
                shortest,
            ))
        })
        .map(|((v, s), len)| (v, s, len))
    }
}

impl PrimaryBlock {
    /// Builds the primary block's CBOR array with every field but the CRC
    /// value itself, which the array's definite length already reserves a
    /// slot for (via `skip_value`) when `crc_type` is not `None`.
    fn emit_body(bundle: &bundle::Bundle) -> Vec<u8> {
        cbor::encode::emit_array(
            Some({
                let mut count = if let crc::CrcType::None = bundle.crc_type {
                    8
                } else {
                    9
                };
                if bundle.id.fragment_info.is_some() {
                    count += 2;
                }
                count
            }),
            |a| {
                a.emit(&7u64);
                a.emit(&bundle.flags);
                a.emit(&bundle.crc_type);
                a.emit(&bundle.destination);
                a.emit(&bundle.id.source);
                a.emit(&bundle.report_to);
                a.emit(&bundle.id.timestamp);
                a.emit(&(bundle.lifetime.as_millis() as u64));

                if let Some(fragment_info) = &bundle.id.fragment_info {
                    a.emit(&fragment_info.offset);
                    a.emit(&fragment_info.total_adu_length);
                }

                if !matches!(bundle.crc_type, crc::CrcType::None) {
                    a.skip_value();
                }
            },
        )
    }

    /// Emits a `PrimaryBlock` into a CBOR-encoded `Vec<u8>`, with its CRC
    /// field computed. This is the bundle's actual wire-form primary block.
    pub fn emit(bundle: &bundle::Bundle) -> Result<Vec<u8>, Error> {
        crc::append_crc_value(bundle.crc_type, Self::emit_body(bundle)).map_err(Into::into)
    }

    /// Emits the primary block's canonical serialization for BPSec's IPPT:
    /// identical to [`Self::emit`], except the CRC field is zero-filled
    /// rather than computed (RFC 9173 §3.7 / §4.E: "the canonical
    /// serialization of the primary block, with its CRC field zeroed for
    /// stability"). The IPPT must not depend on the primary block's actual
    /// CRC value, since that value is unrelated to bundle integrity.
    pub(crate) fn emit_for_ippt(bundle: &bundle::Bundle) -> Vec<u8> {
        let mut bytes = Self::emit_body(bundle);
        bytes.extend_from_slice(&crc::zeroed_crc_bytes(bundle.crc_type));
        bytes
    }
}
