#![cfg_attr(not(feature = "std"), no_std)]

/*!
BPv7 bundle format library implementing RFC 9171, with BPSec Block
Integrity Block support under the BIB-HMAC-SHA2 security context
(RFC 9172/9173).

The crate is a pure, synchronous codec: it builds, encodes, decodes and
validates bundles. It performs no I/O and holds no process-wide state; the
HMAC key used to seal or verify a Block Integrity Block is always supplied
by the caller.
*/

extern crate alloc;

pub mod block;
pub mod bpsec;
pub mod builder;
pub mod bundle;
pub mod creation_timestamp;
pub mod dtn_time;
pub mod eid;
pub mod error;

pub mod crc;

pub use block::{BlockData, BlockFlags, CanonicalBlock};
pub use builder::{BlockBuilder, Builder};
pub use bundle::{Bundle, BundleFlags};
pub use creation_timestamp::CreationTimestamp;
pub use dtn_time::DtnTime;
pub use eid::Eid;
pub use error::Error;
