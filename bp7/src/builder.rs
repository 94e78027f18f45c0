/*!
A staged builder for assembling a [`Bundle`] from its parts. `Builder`
accumulates the primary-block fields and a list of canonical blocks;
[`BlockBuilder`] accumulates the fields of a single extension block before
handing control back to its parent `Builder`. Block numbers are assigned in
the order extension blocks are added, starting at 2; the payload block
always takes block number 1.

Required fields (`destination`, a payload) are enforced at [`Builder::build`]
time, raising [`Error::BuilderIncomplete`] if missing.
*/

use super::*;

const DEFAULT_CRC_TYPE: crc::CrcType = crc::CrcType::CRC32_CASTAGNOLI;
const DEFAULT_LIFETIME_MS: u64 = 24 * 60 * 60 * 1000;

#[cfg(test)]
mod builder_tests;

struct PendingBlock {
    flags: BlockFlags,
    crc_type: crc::CrcType,
    number: Option<u64>,
    data: BlockData,
    unknown_type: Option<u64>,
}

/// Builds a [`Bundle`] field by field.
pub struct Builder {
    flags: BundleFlags,
    crc_type: crc::CrcType,
    source: Eid,
    destination: Option<Eid>,
    report_to: Option<Eid>,
    timestamp: Option<creation_timestamp::CreationTimestamp>,
    lifetime: core::time::Duration,
    payload: Option<PendingBlock>,
    extensions: alloc::vec::Vec<PendingBlock>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            flags: BundleFlags::default(),
            crc_type: DEFAULT_CRC_TYPE,
            source: Eid::default(),
            destination: None,
            report_to: None,
            timestamp: None,
            lifetime: core::time::Duration::from_millis(DEFAULT_LIFETIME_MS),
            payload: None,
            extensions: alloc::vec::Vec::new(),
        }
    }
}

impl Builder {
    /// Starts a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(mut self, flags: BundleFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn crc_type(mut self, crc_type: crc::CrcType) -> Self {
        self.crc_type = crc_type;
        self
    }

    pub fn source(mut self, source: Eid) -> Self {
        self.source = source;
        self
    }

    pub fn destination(mut self, destination: Eid) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn report_to(mut self, report_to: Eid) -> Self {
        self.report_to = Some(report_to);
        self
    }

    /// Sets an explicit creation timestamp, overriding the default of
    /// [`creation_timestamp::CreationTimestamp::now`] taken at `build()` time.
    /// Useful for reproducible bundles and for fragments of a known original.
    pub fn timestamp(mut self, timestamp: creation_timestamp::CreationTimestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn lifetime(mut self, lifetime: core::time::Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets the bundle's payload, block number 1.
    pub fn add_payload_block(mut self, data: alloc::vec::Vec<u8>) -> Self {
        self.payload = Some(PendingBlock {
            flags: BlockFlags::default(),
            crc_type: self.crc_type,
            number: Some(1),
            data: BlockData::Payload(data),
            unknown_type: None,
        });
        self
    }

    /// Adds a Previous Node extension block.
    pub fn add_previous_node_block(self, eid: Eid) -> BlockBuilder {
        BlockBuilder::new(self, BlockData::PreviousNode(eid), None)
    }

    /// Adds a Bundle Age extension block, in milliseconds since creation.
    pub fn add_bundle_age_block(self, age_ms: u64) -> BlockBuilder {
        BlockBuilder::new(self, BlockData::BundleAge(age_ms), None)
    }

    /// Adds a Hop Count extension block with the given hop limit and a
    /// starting hop count of zero.
    pub fn add_hop_count_block(self, limit: u64) -> BlockBuilder {
        BlockBuilder::new(self, BlockData::HopCount { limit, count: 0 }, None)
    }

    /// Adds an unsigned Block Integrity Block over the given security
    /// targets; call [`Bundle::seal_integrity_block`] afterwards to sign it.
    pub fn add_integrity_block(
        self,
        security_source: Eid,
        security_targets: alloc::vec::Vec<u64>,
    ) -> BlockBuilder {
        BlockBuilder::new(
            self,
            BlockData::Integrity(bpsec::bib::Bib::new(security_source, security_targets)),
            None,
        )
    }

    /// Adds an extension block of a type this crate does not otherwise
    /// interpret, carrying the given raw content bytes.
    pub fn add_unknown_block(self, block_type: u64, data: alloc::vec::Vec<u8>) -> BlockBuilder {
        BlockBuilder::new(self, BlockData::Unknown(data), Some(block_type))
    }

    /// Assembles the bundle, assigning block numbers to extension blocks in
    /// the order they were added, and validates the result.
    ///
    /// Fails with [`Error::BuilderIncomplete`] if no destination or payload
    /// has been set.
    pub fn build(self) -> Result<Bundle, Error> {
        let destination = self
            .destination
            .ok_or(Error::BuilderIncomplete("destination"))?;
        let payload = self.payload.ok_or(Error::BuilderIncomplete("payload"))?;

        let mut blocks = alloc::vec::Vec::with_capacity(self.extensions.len() + 1);
        blocks.push(Self::finish_block(payload, 1));

        let mut next_number = 2;
        for pending in self.extensions {
            let number = pending.number.unwrap_or(next_number);
            if pending.number.is_none() {
                next_number += 1;
            }
            blocks.push(Self::finish_block(pending, number));
        }

        let bundle = Bundle {
            id: bundle::Id {
                source: self.source.clone(),
                timestamp: self
                    .timestamp
                    .unwrap_or_else(creation_timestamp::CreationTimestamp::now),
                fragment_info: None,
            },
            flags: self.flags,
            crc_type: self.crc_type,
            destination,
            report_to: self.report_to.unwrap_or(self.source),
            lifetime: self.lifetime,
            blocks,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    fn finish_block(pending: PendingBlock, number: u64) -> CanonicalBlock {
        if let Some(block_type) = pending.unknown_type {
            CanonicalBlock::new_unknown(
                number,
                block_type,
                pending.flags,
                pending.crc_type,
                match pending.data {
                    BlockData::Unknown(d) => d,
                    _ => alloc::vec::Vec::new(),
                },
            )
        } else {
            CanonicalBlock::new(number, pending.flags, pending.crc_type, pending.data)
        }
    }
}

/// Staged construction of a single extension block, returned by `Builder`'s
/// `add_*_block` methods.
pub struct BlockBuilder {
    builder: Builder,
    pending: PendingBlock,
}

impl BlockBuilder {
    fn new(builder: Builder, data: BlockData, unknown_type: Option<u64>) -> Self {
        let crc_type = builder.crc_type;
        Self {
            builder,
            pending: PendingBlock {
                flags: BlockFlags::default(),
                crc_type,
                number: None,
                data,
                unknown_type,
            },
        }
    }

    pub fn must_replicate(mut self, value: bool) -> Self {
        self.pending.flags.must_replicate = value;
        self
    }

    pub fn report_on_failure(mut self, value: bool) -> Self {
        self.pending.flags.report_on_failure = value;
        self
    }

    pub fn delete_bundle_on_failure(mut self, value: bool) -> Self {
        self.pending.flags.delete_bundle_on_failure = value;
        self
    }

    pub fn discard_on_failure(mut self, value: bool) -> Self {
        self.pending.flags.discard_on_failure = value;
        self
    }

    pub fn crc_type(mut self, crc_type: crc::CrcType) -> Self {
        self.pending.crc_type = crc_type;
        self
    }

    /// Overrides the automatically assigned block number.
    pub fn block_number(mut self, number: u64) -> Self {
        self.pending.number = Some(number);
        self
    }

    /// Finishes this block and returns control to the parent `Builder`.
    pub fn build(mut self) -> Builder {
        self.builder.extensions.push(self.pending);
        self.builder
    }
}
