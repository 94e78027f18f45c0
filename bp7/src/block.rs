/*!
This module defines the structure and components of a BPv7 canonical block:
the payload block and the typed extension blocks (previous-node, bundle-age,
hop-count, integrity) carried alongside it, plus an opaque fallback for any
other block type. It includes the block processing control flags, the block
type code, and the `CanonicalBlock` struct that ties them to a block number.
*/

use super::*;
use error::CaptureFieldErr;

/// Processing control flags for a BPv7 canonical block, RFC 9171 §4.2.4.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockFlags {
    /// If set, the block must be replicated in every fragment of the bundle.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub must_replicate: bool,
    /// If set, a status report should be generated if block processing fails.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub report_on_failure: bool,
    /// If set, the entire bundle should be deleted if block processing fails.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub delete_bundle_on_failure: bool,
    /// If set, this block should be discarded (but the bundle kept) if
    /// processing fails.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub discard_on_failure: bool,

    /// A bitmask of any unrecognized flags encountered during parsing.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub unrecognised: Option<u64>,
}

impl From<&BlockFlags> for u64 {
    fn from(value: &BlockFlags) -> Self {
        let mut flags = value.unrecognised.unwrap_or_default();
        if value.must_replicate {
            flags |= 1 << 0;
        }
        if value.report_on_failure {
            flags |= 1 << 1;
        }
        if value.delete_bundle_on_failure {
            flags |= 1 << 2;
        }
        if value.discard_on_failure {
            flags |= 1 << 4;
        }
        flags
    }
}

impl From<u64> for BlockFlags {
    fn from(value: u64) -> Self {
        let mut flags = Self::default();
        let mut unrecognised = value;

        if (value & (1 << 0)) != 0 {
            flags.must_replicate = true;
            unrecognised &= !(1 << 0);
        }
        if (value & (1 << 1)) != 0 {
            flags.report_on_failure = true;
            unrecognised &= !(1 << 1);
        }
        if (value & (1 << 2)) != 0 {
            flags.delete_bundle_on_failure = true;
            unrecognised &= !(1 << 2);
        }
        if (value & (1 << 4)) != 0 {
            flags.discard_on_failure = true;
            unrecognised &= !(1 << 4);
        }

        if unrecognised != 0 {
            flags.unrecognised = Some(unrecognised);
        }
        flags
    }
}

impl cbor::encode::ToCbor for BlockFlags {
    type Result = ();

    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) -> Self::Result {
        encoder.emit(&u64::from(self))
    }
}

impl cbor::decode::FromCbor for BlockFlags {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse::<(u64, bool, usize)>(data)
            .map(|(value, shortest, len)| (value.into(), shortest, len))
    }
}

/// The type of a BPv7 canonical block, RFC 9171 §4.2.1 / RFC 9172.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// Payload Block (type code 1).
    Payload,
    /// Previous Node Block (type code 6).
    PreviousNode,
    /// Bundle Age Block (type code 7).
    BundleAge,
    /// Hop Count Block (type code 10).
    HopCount,
    /// Block Integrity Block, BPSec BIB (type code 11, RFC 9172).
    Integrity,
    /// An unrecognized block type with its type code.
    Unrecognised(u64),
}

impl From<Type> for u64 {
    fn from(value: Type) -> Self {
        match value {
            Type::Payload => 1,
            Type::PreviousNode => 6,
            Type::BundleAge => 7,
            Type::HopCount => 10,
            Type::Integrity => 11,
            Type::Unrecognised(v) => v,
        }
    }
}

impl From<u64> for Type {
    fn from(value: u64) -> Self {
        match value {
            1 => Type::Payload,
            6 => Type::PreviousNode,
            7 => Type::BundleAge,
            10 => Type::HopCount,
            11 => Type::Integrity,
            value => Type::Unrecognised(value),
        }
    }
}

impl cbor::encode::ToCbor for Type {
    type Result = ();

    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) -> Self::Result {
        encoder.emit(&u64::from(*self))
    }
}

impl cbor::decode::FromCbor for Type {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse::<(u64, bool, usize)>(data)
            .map(|(value, shortest, len)| (value.into(), shortest, len))
    }
}

/// The decoded, type-specific content of a canonical block's data field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockData {
    /// The bundle's application data unit.
    Payload(Vec<u8>),
    /// The EID of the node that last forwarded the bundle.
    PreviousNode(eid::Eid),
    /// Milliseconds since the bundle was created, for sources with no clock.
    BundleAge(u64),
    /// The configured hop limit and the current hop count.
    HopCount {
        /// The maximum number of hops this bundle may take.
        limit: u64,
        /// The number of hops taken so far.
        count: u64,
    },
    /// A BPSec Block Integrity Block body.
    Integrity(bpsec::bib::Bib),
    /// Raw data for a block type this crate does not otherwise interpret.
    Unknown(Vec<u8>),
}

impl BlockData {
    /// The block type code this data corresponds to. Only meaningful for
    /// the non-opaque variants; callers holding an `Unknown` value must
    /// track the original type code alongside it (see `CanonicalBlock`).
    fn type_hint(&self) -> Option<Type> {
        match self {
            BlockData::Payload(_) => Some(Type::Payload),
            BlockData::PreviousNode(_) => Some(Type::PreviousNode),
            BlockData::BundleAge(_) => Some(Type::BundleAge),
            BlockData::HopCount { .. } => Some(Type::HopCount),
            BlockData::Integrity(_) => Some(Type::Integrity),
            BlockData::Unknown(_) => None,
        }
    }

    /// Serializes the inner value to the bytes that are wrapped as the
    /// block's outer CBOR byte-string. This is also the "content" octet
    /// string that BPSec's IPPT construction covers.
    pub(crate) fn content_bytes(&self) -> Vec<u8> {
        match self {
            BlockData::Payload(b) | BlockData::Unknown(b) => b.clone(),
            BlockData::PreviousNode(eid) => cbor::encode::emit(eid).0,
            BlockData::BundleAge(ms) => cbor::encode::emit(ms).0,
            BlockData::HopCount { limit, count } => {
                cbor::encode::emit_array(Some(2), |a| {
                    a.emit(limit);
                    a.emit(count);
                })
            }
            BlockData::Integrity(bib) => cbor::encode::emit(bib).0,
        }
    }

    fn parse(block_type: Type, block_number: u64, data: &[u8]) -> Result<Self, Error> {
        match block_type {
            Type::Payload => Ok(BlockData::Payload(data.to_vec())),
            Type::PreviousNode => cbor::decode::parse::<eid::Eid>(data)
                .map(BlockData::PreviousNode)
                .map_err(|_| Error::InvalidCanonicalBlock(block_number, block_type)),
            Type::BundleAge => cbor::decode::parse::<u64>(data)
                .map(BlockData::BundleAge)
                .map_err(|_| Error::InvalidCanonicalBlock(block_number, block_type)),
            Type::HopCount => cbor::decode::parse_array::<(u64, u64), _, cbor::decode::Error>(
                data,
                |a, _, _| {
                    let (limit, _) = a.parse()?;
                    let (count, _) = a.parse()?;
                    Ok((limit, count))
                },
            )
            .map(|((limit, count), _)| BlockData::HopCount { limit, count })
            .map_err(|_| Error::InvalidCanonicalBlock(block_number, block_type)),
            Type::Integrity => cbor::decode::parse::<bpsec::bib::Bib>(data)
                .map(BlockData::Integrity)
                .map_field_err("integrity block body"),
            Type::Unrecognised(_) => Ok(BlockData::Unknown(data.to_vec())),
        }
    }
}

/// A single canonical block: its block number, control flags, CRC
/// configuration, and typed content.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanonicalBlock {
    /// The block number, unique within the bundle.
    pub number: u64,
    /// The block-specific processing control flags.
    pub flags: BlockFlags,
    /// The CRC type used for this block's integrity check.
    pub crc_type: crc::CrcType,
    /// The raw block type code, kept alongside `data` so an `Unknown`
    /// payload remembers the type code it was decoded under.
    block_type: Type,
    /// The block's decoded, type-specific content.
    pub data: BlockData,
}

impl CanonicalBlock {
    /// Builds a new canonical block, inferring the block type code from
    /// `data` (opaque `Unknown` content must use [`Self::new_unknown`]).
    pub fn new(number: u64, flags: BlockFlags, crc_type: crc::CrcType, data: BlockData) -> Self {
        let block_type = data.type_hint().unwrap_or(Type::Unrecognised(0));
        Self {
            number,
            flags,
            crc_type,
            block_type,
            data,
        }
    }

    /// Builds a new canonical block carrying opaque data under an explicit,
    /// unrecognized block type code.
    pub fn new_unknown(
        number: u64,
        block_type: u64,
        flags: BlockFlags,
        crc_type: crc::CrcType,
        data: Vec<u8>,
    ) -> Self {
        Self {
            number,
            flags,
            crc_type,
            block_type: Type::Unrecognised(block_type),
            data: BlockData::Unknown(data),
        }
    }

    /// The block type code of this block's content.
    pub fn block_type(&self) -> Type {
        self.block_type
    }

    /// Emits the block as a CBOR-encoded byte array, returning the bytes.
    pub(crate) fn emit(&self) -> Result<Vec<u8>, Error> {
        let content = self.data.content_bytes();
        crc::append_crc_value(
            self.crc_type,
            cbor::encode::emit_array(
                Some(if let crc::CrcType::None = self.crc_type {
                    5
                } else {
                    6
                }),
                |a| {
                    a.emit(&self.block_type);
                    a.emit(&self.number);
                    a.emit(&self.flags);
                    a.emit(&self.crc_type);
                    a.emit(&cbor::encode::Bytes(&content));
                    if !matches!(self.crc_type, crc::CrcType::None) {
                        a.skip_value();
                    }
                },
            ),
        )
        .map_err(Into::into)
    }

    /// Builds the "target header" octet string used by BPSec's IPPT:
    /// `[blockType, blockNumber, blockControlFlags, crcType]`, with no
    /// data and no CRC.
    pub(crate) fn header_bytes(&self) -> Vec<u8> {
        cbor::encode::emit_array(Some(4), |a| {
            a.emit(&self.block_type);
            a.emit(&self.number);
            a.emit(&self.flags);
            a.emit(&self.crc_type);
        })
    }
}

impl cbor::decode::FromCbor for CanonicalBlock {
    type Error = Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse_array(data, |arr, mut shortest, tags| {
            shortest = shortest && tags.is_empty() && arr.is_definite();

            let block_type = arr
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("block type code")?;

            let block_number: u64 = arr.parse().map_field_err("block number").map(|(v, s)| {
                shortest = shortest && s;
                v
            })?;
            match (block_number, block_type) {
                (1, Type::Payload) => {}
                (0, _) | (1, _) | (_, Type::Payload) => {
                    return Err(Error::InvalidBlockNumber(block_number, block_type));
                }
                _ => {}
            }

            let flags = arr
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("block processing control flags")?;

            let crc_type = arr
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("CRC type")?;

            let content = arr
                .parse_value(|value, s, tags| {
                    shortest = shortest && s && tags.is_empty();
                    match value {
                        cbor::decode::Value::Bytes(r) => Ok(data[r].to_vec()),
                        v => Err(Error::InvalidField {
                            field: "block data",
                            source: cbor::decode::Error::IncorrectType(
                                "Byte String".to_string(),
                                v.type_name(!tags.is_empty()),
                            )
                            .into(),
                        }),
                    }
                })
                .map_field_err("block data")?;

            shortest = crc::parse_crc_value(data, arr, crc_type)? && shortest;

            Ok((
                CanonicalBlock {
                    number: block_number,
                    flags,
                    crc_type,
                    block_type,
                    data: BlockData::parse(block_type, block_number, &content)?,
                },
                shortest,
            ))
        })
        .map(|((v, s), len)| (v, s, len))
    }
}
