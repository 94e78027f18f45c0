/*!
BPSec (RFC 9172) Block Integrity Block support, restricted to the
BIB-HMAC-SHA2 security context (RFC 9173 §3). Block Confidentiality
(BCB) is out of scope: this crate only ever produces or consumes
integrity blocks.
*/

use super::*;

pub mod bib;

mod error;

use error::CaptureFieldErr;

pub use error::Error;

/// The security context id for BIB-HMAC-SHA2, the only context this crate
/// implements.
pub const BIB_HMAC_SHA2_CONTEXT_ID: u64 = 1;

/// The SHA-2 variant a BIB's HMAC is computed under, RFC 9173 §3.3.3.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShaVariant {
    /// HMAC-SHA-256, 32-byte MAC.
    HMAC_256,
    /// HMAC-SHA-384, 48-byte MAC. The RFC 9173 default.
    HMAC_384,
    /// HMAC-SHA-512, 64-byte MAC.
    HMAC_512,
}

impl Default for ShaVariant {
    fn default() -> Self {
        Self::HMAC_384
    }
}

impl ShaVariant {
    /// The length, in bytes, of the MAC this variant produces.
    pub fn mac_len(self) -> usize {
        match self {
            Self::HMAC_256 => 32,
            Self::HMAC_384 => 48,
            Self::HMAC_512 => 64,
        }
    }
}

impl TryFrom<u64> for ShaVariant {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::HMAC_256),
            6 => Ok(Self::HMAC_384),
            7 => Ok(Self::HMAC_512),
            v => Err(Error::UnsupportedShaVariant(v)),
        }
    }
}

impl From<ShaVariant> for u64 {
    fn from(value: ShaVariant) -> Self {
        match value {
            ShaVariant::HMAC_256 => 5,
            ShaVariant::HMAC_384 => 6,
            ShaVariant::HMAC_512 => 7,
        }
    }
}

/// Bitfield selecting which portions of the bundle enter a BIB's IPPT,
/// RFC 9173 §3.3.3.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegrityScopeFlags {
    /// Include the canonical primary block (CRC zeroed) in the IPPT.
    pub include_primary_block: bool,
    /// Include each target's header (type, number, flags, CRC type) in the IPPT.
    pub include_target_header: bool,
    /// Include this BIB's own security header in the IPPT.
    pub include_security_header: bool,
}

impl Default for IntegrityScopeFlags {
    fn default() -> Self {
        0x7u64.into()
    }
}

impl From<u64> for IntegrityScopeFlags {
    fn from(value: u64) -> Self {
        Self {
            include_primary_block: value & 0x1 != 0,
            include_target_header: value & 0x2 != 0,
            include_security_header: value & 0x4 != 0,
        }
    }
}

impl From<IntegrityScopeFlags> for u64 {
    fn from(value: IntegrityScopeFlags) -> Self {
        let mut v = 0;
        if value.include_primary_block {
            v |= 0x1;
        }
        if value.include_target_header {
            v |= 0x2;
        }
        if value.include_security_header {
            v |= 0x4;
        }
        v
    }
}
