/*!
This module defines the core `Bundle` structure and its components, providing
the primary interface for creating, parsing, and interacting with BPv7
bundles. It orchestrates the primary block, the ordered list of canonical
blocks, and BPSec Block Integrity Block sealing and verification.
*/

use super::*;

mod primary_block;

#[cfg(test)]
mod tests;

/// Holds fragmentation information for a bundle.
///
/// As defined in RFC 9171 §4.2.1, this information is present in the primary
/// block if the bundle is a fragment of a larger original bundle.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentInfo {
    /// The offset of this fragment's payload within the original bundle's payload.
    pub offset: u64,
    /// The total length of the original bundle's payload.
    pub total_adu_length: u64,
}

/// Represents the unique identifier of a BPv7 bundle.
///
/// A bundle ID is a tuple of `(source EID, creation timestamp, fragment
/// info)`. This combination is unique across the DTN.
#[derive(Default, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id {
    /// The EID of the node that created the bundle.
    pub source: eid::Eid,
    /// The creation timestamp, including a sequence number for uniqueness.
    pub timestamp: creation_timestamp::CreationTimestamp,
    /// Fragmentation information, if this bundle is a fragment.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub fragment_info: Option<FragmentInfo>,
}

impl core::fmt::Display for Id {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(fi) = &self.fragment_info {
            write!(
                f,
                "{}/{} fragment {}/{}",
                self.source, self.timestamp, fi.offset, fi.total_adu_length
            )
        } else {
            write!(f, "{}/{}", self.source, self.timestamp)
        }
    }
}

/// Processing control flags for a BPv7 bundle, RFC 9171 §4.2.3.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BundleFlags {
    /// If set, this bundle is a fragment of a larger bundle.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub is_fragment: bool,
    /// If set, the payload is an administrative record.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub is_admin_record: bool,
    /// If set, the bundle must not be fragmented.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub do_not_fragment: bool,
    /// If set, the destination application is requested to send an acknowledgement.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub app_ack_requested: bool,
    /// If set, status reports should include the time of the reported event.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub report_status_time: bool,
    /// If set, a status report should be generated upon bundle reception.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub receipt_report_requested: bool,
    /// If set, a status report should be generated upon bundle forwarding.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub forward_report_requested: bool,
    /// If set, a status report should be generated upon bundle delivery.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub delivery_report_requested: bool,
    /// If set, a status report should be generated upon bundle deletion.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "<&bool as core::ops::Not>::not")
    )]
    pub delete_report_requested: bool,

    /// A bitmask of any unrecognized flags encountered during parsing.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub unrecognised: Option<u64>,
}

impl From<u64> for BundleFlags {
    fn from(value: u64) -> Self {
        let mut flags = Self::default();
        let mut unrecognised = value;

        if (value & (1 << 0)) != 0 {
            flags.is_fragment = true;
            unrecognised &= !(1 << 0);
        }
        if (value & (1 << 1)) != 0 {
            flags.is_admin_record = true;
            unrecognised &= !(1 << 1);
        }
        if (value & (1 << 2)) != 0 {
            flags.do_not_fragment = true;
            unrecognised &= !(1 << 2);
        }
        if (value & (1 << 5)) != 0 {
            flags.app_ack_requested = true;
            unrecognised &= !(1 << 5);
        }
        if (value & (1 << 6)) != 0 {
            flags.report_status_time = true;
            unrecognised &= !(1 << 6);
        }
        if (value & (1 << 14)) != 0 {
            flags.receipt_report_requested = true;
            unrecognised &= !(1 << 14);
        }
        if (value & (1 << 16)) != 0 {
            flags.forward_report_requested = true;
            unrecognised &= !(1 << 16);
        }
        if (value & (1 << 17)) != 0 {
            flags.delivery_report_requested = true;
            unrecognised &= !(1 << 17);
        }
        if (value & (1 << 18)) != 0 {
            flags.delete_report_requested = true;
            unrecognised &= !(1 << 18);
        }

        if unrecognised != 0 {
            flags.unrecognised = Some(unrecognised);
        }
        flags
    }
}

impl From<&BundleFlags> for u64 {
    fn from(value: &BundleFlags) -> Self {
        let mut flags = value.unrecognised.unwrap_or(0);
        if value.is_fragment {
            flags |= 1 << 0;
        }
        if value.is_admin_record {
            flags |= 1 << 1;
        }
        if value.do_not_fragment {
            flags |= 1 << 2;
        }
        if value.app_ack_requested {
            flags |= 1 << 5;
        }
        if value.report_status_time {
            flags |= 1 << 6;
        }
        if value.receipt_report_requested {
            flags |= 1 << 14;
        }
        if value.forward_report_requested {
            flags |= 1 << 16;
        }
        if value.delivery_report_requested {
            flags |= 1 << 17;
        }
        if value.delete_report_requested {
            flags |= 1 << 18;
        }
        flags
    }
}

impl cbor::encode::ToCbor for BundleFlags {
    type Result = ();

    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) -> Self::Result {
        encoder.emit(&u64::from(self))
    }
}

impl cbor::decode::FromCbor for BundleFlags {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse::<(u64, bool, usize)>(data)
            .map(|(value, shortest, len)| (value.into(), shortest, len))
    }
}

/// A complete BPv7 bundle: the primary block fields plus an ordered list of
/// canonical blocks.
///
/// Blocks are kept in a `Vec`, in the order they were declared (or, for a
/// freshly built bundle, the order they were added), so that `decode(encode(b))`
/// reproduces the same block sequence.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bundle {
    /// The unique identifier for the bundle.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub id: Id,
    /// The bundle-specific processing control flags.
    pub flags: BundleFlags,
    /// The type of CRC used for the primary block's integrity check.
    pub crc_type: crc::CrcType,
    /// The EID of the bundle's final destination.
    pub destination: eid::Eid,
    /// The EID to which status reports should be sent.
    pub report_to: eid::Eid,
    /// The time duration after which the bundle should be considered expired.
    pub lifetime: core::time::Duration,
    /// The bundle's canonical blocks, in declared order. Does not include
    /// the primary block.
    pub blocks: alloc::vec::Vec<block::CanonicalBlock>,
}

impl Bundle {
    /// Finds the unique block with the given block number, if any.
    pub fn block_by_number(&self, number: u64) -> Option<&block::CanonicalBlock> {
        self.blocks.iter().find(|b| b.number == number)
    }

    /// Iterates over every block of the given type.
    pub fn blocks_by_type(
        &self,
        block_type: block::Type,
    ) -> impl Iterator<Item = &block::CanonicalBlock> {
        self.blocks.iter().filter(move |b| b.block_type() == block_type)
    }

    /// The bundle's unique payload block (block number 1), if present.
    pub fn payload_block(&self) -> Option<&block::CanonicalBlock> {
        self.block_by_number(1)
    }

    /// The bundle's application data unit, if a payload block is present.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.payload_block()?.data {
            block::BlockData::Payload(b) => Some(b),
            _ => None,
        }
    }

    /// Checks the structural invariants RFC 9171 places on a bundle:
    /// exactly one payload block at block number 1, no duplicate block
    /// numbers, and a well-formed fragment/flag combination.
    pub fn validate(&self) -> Result<(), Error> {
        if self.flags.is_fragment != self.id.fragment_info.is_some() {
            return Err(Error::InvalidFlags);
        }
        if self.lifetime.is_zero() {
            return Err(Error::InvalidField {
                field: "lifetime",
                source: "bundle lifetime must be non-zero".into(),
            });
        }

        let mut seen = alloc::vec::Vec::with_capacity(self.blocks.len());
        let mut has_payload_at_one = false;
        for b in &self.blocks {
            if seen.contains(&b.number) {
                return Err(Error::DuplicateBlockNumber(b.number));
            }
            seen.push(b.number);

            if matches!(b.data, block::BlockData::Payload(_)) {
                if b.number != 1 {
                    return Err(Error::InvalidBlockNumber(b.number, b.block_type()));
                }
                has_payload_at_one = true;
            }
        }
        if !has_payload_at_one {
            return Err(Error::MissingPayloadBlock);
        }

        for b in &self.blocks {
            if let block::BlockData::Integrity(bib) = &b.data {
                for target in &bib.security_targets {
                    if self.block_by_number(*target).is_none() {
                        return Err(bpsec::Error::MissingSecurityTarget(*target).into());
                    }
                }
            }
        }

        Ok(())
    }

    /// Sets the CRC type uniformly across the primary block and every
    /// canonical block.
    pub fn set_crc(&mut self, crc_type: crc::CrcType) {
        self.crc_type = crc_type;
        for b in &mut self.blocks {
            b.crc_type = crc_type;
        }
    }

    /// Encodes the bundle to its canonical wire form: an indefinite-length
    /// CBOR array whose elements are CBOR byte-strings, the first wrapping
    /// the encoded primary block and the rest wrapping each canonical block,
    /// in `blocks` order (RFC 9171 §4.1).
    pub fn encode(&self) -> Result<alloc::vec::Vec<u8>, Error> {
        let primary = primary_block::PrimaryBlock::emit(self)?;
        let mut block_bytes = alloc::vec::Vec::with_capacity(self.blocks.len());
        for b in &self.blocks {
            block_bytes.push(b.emit()?);
        }
        Ok(cbor::encode::emit_array(None, |a| {
            a.emit(&cbor::encode::Bytes(&primary));
            for bytes in &block_bytes {
                a.emit(&cbor::encode::Bytes(bytes));
            }
        }))
    }

    /// Decodes and fully validates a bundle from its wire form. Accepts both
    /// definite- and indefinite-length outer arrays.
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let (bundle, _, _) = cbor::decode::FromCbor::from_cbor(data)?;
        Ok(bundle)
    }

    /// Seals a Block Integrity Block already present at `bib_block_number`,
    /// computing its security result over its declared targets using `key`.
    /// The BIB's own canonical block is re-emitted with the updated,
    /// sealed body.
    pub fn seal_integrity_block(
        &mut self,
        bib_block_number: u64,
        key: &[u8],
    ) -> Result<(), Error> {
        let primary_bytes = primary_block::PrimaryBlock::emit_for_ippt(self);

        let bib_index = self
            .blocks
            .iter()
            .position(|b| b.number == bib_block_number)
            .ok_or(Error::MissingBlock(bib_block_number))?;

        let (mut bib, own_flags) = match &self.blocks[bib_index].data {
            block::BlockData::Integrity(bib) => (bib.clone(), self.blocks[bib_index].flags.clone()),
            _ => {
                return Err(Error::InvalidField {
                    field: "block type",
                    source: "block is not a Block Integrity Block".into(),
                });
            }
        };

        let mut targets = alloc::vec::Vec::with_capacity(bib.security_targets.len());
        for target in &bib.security_targets {
            let target_block = self
                .block_by_number(*target)
                .ok_or(bpsec::Error::MissingSecurityTarget(*target))?;
            targets.push((target_block.header_bytes(), target_block.data.content_bytes()));
        }

        bib.seal(key, bib_block_number, &own_flags, &primary_bytes, &targets)?;
        self.blocks[bib_index].data = block::BlockData::Integrity(bib);
        Ok(())
    }

    /// Verifies a Block Integrity Block's security result against its
    /// declared targets using `key`.
    pub fn verify_integrity_block(&self, bib_block_number: u64, key: &[u8]) -> Result<(), Error> {
        let primary_bytes = primary_block::PrimaryBlock::emit_for_ippt(self);

        let bib_block = self
            .block_by_number(bib_block_number)
            .ok_or(Error::MissingBlock(bib_block_number))?;
        let bib = match &bib_block.data {
            block::BlockData::Integrity(bib) => bib,
            _ => {
                return Err(Error::InvalidField {
                    field: "block type",
                    source: "block is not a Block Integrity Block".into(),
                });
            }
        };

        let mut targets = alloc::vec::Vec::with_capacity(bib.security_targets.len());
        for target in &bib.security_targets {
            let target_block = self
                .block_by_number(*target)
                .ok_or(bpsec::Error::MissingSecurityTarget(*target))?;
            targets.push((target_block.header_bytes(), target_block.data.content_bytes()));
        }

        bib.verify(key, bib_block_number, &bib_block.flags, &primary_bytes, &targets)
            .map_err(Into::into)
    }
}

impl cbor::decode::FromCbor for Bundle {
    type Error = Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse_array(data, |outer, s, tags| {
            let mut shortest = s && tags.is_empty();

            let Some((primary_bytes, p_shortest)) = outer.try_parse_value(|value, s, tags| {
                match value {
                    cbor::decode::Value::Bytes(r) => Ok((data[r].to_vec(), s && tags.is_empty())),
                    v => Err(cbor::decode::Error::IncorrectType(
                        "Byte String".to_string(),
                        v.type_name(!tags.is_empty()),
                    )),
                }
            })?
            else {
                return Err(Error::InvalidBundle);
            };
            shortest = shortest && p_shortest;

            let primary: primary_block::PrimaryBlock = cbor::decode::parse(&primary_bytes)?;

            let mut blocks = alloc::vec::Vec::new();
            while let Some((block_bytes, b_shortest)) = outer.try_parse_value(|value, s, tags| {
                match value {
                    cbor::decode::Value::Bytes(r) => Ok((data[r].to_vec(), s && tags.is_empty())),
                    v => Err(cbor::decode::Error::IncorrectType(
                        "Byte String".to_string(),
                        v.type_name(!tags.is_empty()),
                    )),
                }
            })? {
                shortest = shortest && b_shortest;
                let block = cbor::decode::parse::<block::CanonicalBlock>(&block_bytes)?;
                blocks.push(block);
            }

            shortest = shortest && outer.is_definite();

            let bundle = Bundle {
                id: Id {
                    source: primary.source,
                    timestamp: primary.timestamp,
                    fragment_info: primary.fragment_info,
                },
                flags: primary.flags,
                crc_type: primary.crc_type,
                destination: primary.destination,
                report_to: primary.report_to,
                lifetime: primary.lifetime,
                blocks,
            };
            bundle.validate()?;

            Ok((bundle, shortest))
        })
        .map(|((v, s), len)| (v, s, len))
    }
}
