/*!
The BPSec Block Integrity Block body (RFC 9172 §3.6, RFC 9173 §3), carried
as the inner data of a canonical block of type 11. A `Bib` is a value type
with two persisted states: **unsigned** (`security_results` empty) and
**sealed** (one result per target). `verify` is a pure check over a sealed
instance; it does not mutate the `Bib`.
*/

use super::*;
use error::CaptureFieldErr;
use hmac::{Hmac, Mac};

#[cfg(test)]
mod bib_tests;

/// A BPSec Block Integrity Block body under the BIB-HMAC-SHA2 context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bib {
    /// Block numbers this BIB protects, in order.
    pub security_targets: Vec<u64>,
    /// The EID of the node that computed the integrity signature.
    pub security_source: eid::Eid,
    /// The SHA-2 variant the HMAC is computed under.
    pub sha_variant: ShaVariant,
    /// Which parts of the bundle enter the IPPT.
    pub integrity_scope_flags: IntegrityScopeFlags,
    /// An opaque wrapped key, when the key is carried rather than pre-shared.
    pub wrapped_key: Option<Vec<u8>>,
    /// One MAC per security target, in the same order as `security_targets`.
    /// Empty iff this BIB is unsigned.
    pub security_results: Vec<Vec<u8>>,
}

impl Bib {
    /// Builds a fresh, unsigned BIB over the given targets.
    pub fn new(security_source: eid::Eid, security_targets: Vec<u64>) -> Self {
        Self {
            security_targets,
            security_source,
            sha_variant: ShaVariant::default(),
            integrity_scope_flags: IntegrityScopeFlags::default(),
            wrapped_key: None,
            security_results: Vec::new(),
        }
    }

    /// `true` once `security_results` carries one MAC per target.
    pub fn is_sealed(&self) -> bool {
        !self.security_results.is_empty()
    }

    fn uses_non_default_parameters(&self) -> bool {
        self.sha_variant != ShaVariant::default()
            || self.integrity_scope_flags != IntegrityScopeFlags::default()
            || self.wrapped_key.is_some()
    }

    /// The `[blockType(=11), blockNumber, blockControlFlags]` security header
    /// for the canonical block that carries this BIB.
    fn security_header_bytes(own_number: u64, own_flags: &block::BlockFlags) -> Vec<u8> {
        cbor::encode::emit_array(Some(3), |a| {
            a.emit(&block::Type::Integrity);
            a.emit(&own_number);
            a.emit(own_flags);
        })
    }

    fn ippt(
        &self,
        primary_bytes: &[u8],
        target_header: &[u8],
        security_header: &[u8],
        target_content: &[u8],
    ) -> Vec<u8> {
        let mut ippt = cbor::encode::emit(&u64::from(self.integrity_scope_flags)).0;
        if self.integrity_scope_flags.include_primary_block {
            ippt.extend_from_slice(primary_bytes);
        }
        if self.integrity_scope_flags.include_target_header {
            ippt.extend_from_slice(target_header);
        }
        if self.integrity_scope_flags.include_security_header {
            ippt.extend_from_slice(security_header);
        }
        ippt.extend_from_slice(target_content);
        ippt
    }

    fn mac(&self, key: &[u8], message: &[u8]) -> Vec<u8> {
        match self.sha_variant {
            ShaVariant::HMAC_256 => {
                let mut mac = Hmac::<sha2::Sha256>::new_from_slice(key)
                    .expect("HMAC accepts keys of any length");
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            ShaVariant::HMAC_384 => {
                let mut mac = Hmac::<sha2::Sha384>::new_from_slice(key)
                    .expect("HMAC accepts keys of any length");
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            ShaVariant::HMAC_512 => {
                let mut mac = Hmac::<sha2::Sha512>::new_from_slice(key)
                    .expect("HMAC accepts keys of any length");
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }

    fn mac_matches(&self, key: &[u8], message: &[u8], expected: &[u8]) -> bool {
        match self.sha_variant {
            ShaVariant::HMAC_256 => Hmac::<sha2::Sha256>::new_from_slice(key)
                .map(|mut mac| {
                    mac.update(message);
                    mac.verify_slice(expected).is_ok()
                })
                .unwrap_or(false),
            ShaVariant::HMAC_384 => Hmac::<sha2::Sha384>::new_from_slice(key)
                .map(|mut mac| {
                    mac.update(message);
                    mac.verify_slice(expected).is_ok()
                })
                .unwrap_or(false),
            ShaVariant::HMAC_512 => Hmac::<sha2::Sha512>::new_from_slice(key)
                .map(|mut mac| {
                    mac.update(message);
                    mac.verify_slice(expected).is_ok()
                })
                .unwrap_or(false),
        }
    }

    /// Signs every declared target and stores the resulting MACs, taking this
    /// BIB from unsigned to sealed.
    ///
    /// `own_number`/`own_flags` identify the canonical block carrying this
    /// BIB; `primary_bytes` is the canonical (CRC-zeroed) primary block;
    /// `targets` supplies, in `security_targets` order, each target's header
    /// bytes and content bytes.
    pub(crate) fn seal(
        &mut self,
        key: &[u8],
        own_number: u64,
        own_flags: &block::BlockFlags,
        primary_bytes: &[u8],
        targets: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<(), Error> {
        if self.security_targets.is_empty() {
            return Err(Error::NoTargets);
        }
        if targets.len() != self.security_targets.len() {
            return Err(Error::MismatchedResults);
        }

        let security_header = Self::security_header_bytes(own_number, own_flags);
        self.security_results = targets
            .iter()
            .map(|(header, content)| {
                self.mac(key, &self.ippt(primary_bytes, header, &security_header, content))
            })
            .collect();
        Ok(())
    }

    /// Recomputes the MAC for every target and compares it, in constant
    /// time, against the stored result.
    pub(crate) fn verify(
        &self,
        key: &[u8],
        own_number: u64,
        own_flags: &block::BlockFlags,
        primary_bytes: &[u8],
        targets: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<(), Error> {
        if self.security_targets.is_empty() {
            return Err(Error::NoTargets);
        }
        if targets.len() != self.security_targets.len()
            || self.security_results.len() != self.security_targets.len()
        {
            return Err(Error::MismatchedResults);
        }

        let security_header = Self::security_header_bytes(own_number, own_flags);
        for ((header, content), expected) in targets.iter().zip(self.security_results.iter()) {
            let ippt = self.ippt(primary_bytes, header, &security_header, content);
            if !self.mac_matches(key, &ippt, expected) {
                return Err(Error::IntegrityMismatch);
            }
        }
        Ok(())
    }
}

impl cbor::encode::ToCbor for Bib {
    type Result = ();

    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) -> Self::Result {
        let has_params = self.uses_non_default_parameters();
        encoder.emit_array(Some(if has_params { 6 } else { 5 }), |a| {
            a.emit_array(Some(self.security_targets.len()), |ta| {
                for t in &self.security_targets {
                    ta.emit(t);
                }
            });
            a.emit(&super::BIB_HMAC_SHA2_CONTEXT_ID);
            a.emit(&(has_params as u64));
            a.emit(&self.security_source);
            if has_params {
                let mut params: Vec<u64> = Vec::new();
                if self.sha_variant != ShaVariant::default() {
                    params.push(1);
                }
                if self.wrapped_key.is_some() {
                    params.push(2);
                }
                if self.integrity_scope_flags != IntegrityScopeFlags::default() {
                    params.push(3);
                }
                a.emit_array(Some(params.len()), |pa| {
                    for id in &params {
                        pa.emit_array(Some(2), |p| {
                            p.emit(id);
                            match id {
                                1 => p.emit(&u64::from(self.sha_variant)),
                                2 => p.emit(&cbor::encode::Bytes(
                                    self.wrapped_key.as_ref().unwrap(),
                                )),
                                3 => p.emit(&u64::from(self.integrity_scope_flags)),
                                _ => unreachable!(),
                            }
                        });
                    }
                });
            }
            a.emit_array(Some(self.security_results.len()), |ra| {
                for result in &self.security_results {
                    ra.emit_array(Some(1), |r| {
                        r.emit_array(Some(2), |pair| {
                            pair.emit(&1u64);
                            pair.emit(&cbor::encode::Bytes(result));
                        });
                    });
                }
            });
        })
    }
}

impl cbor::decode::FromCbor for Bib {
    type Error = Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, bool, usize), Self::Error> {
        cbor::decode::parse_array(data, |arr, mut shortest, tags| {
            shortest = shortest && tags.is_empty() && arr.is_definite();

            let security_targets = arr
                .parse_array(|ta, s, _| {
                    shortest = shortest && s;
                    let mut targets = Vec::new();
                    while let Some((t, s)) = ta.try_parse::<u64>()? {
                        shortest = shortest && s;
                        targets.push(t);
                    }
                    Ok::<_, Error>(targets)
                })
                .map_field_err("security targets")?;

            let context_id: u64 = arr
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("security context id")?;
            if context_id != super::BIB_HMAC_SHA2_CONTEXT_ID {
                return Err(Error::UnrecognisedContext(context_id));
            }

            let context_flags: u64 = arr
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("security context flags")?;

            let security_source = arr
                .parse()
                .map(|(v, s)| {
                    shortest = shortest && s;
                    v
                })
                .map_field_err("security source")?;

            let mut sha_variant = ShaVariant::default();
            let mut wrapped_key = None;
            let mut integrity_scope_flags = IntegrityScopeFlags::default();

            if context_flags & 1 != 0 {
                arr.parse_array(|pa, s, _| {
                    shortest = shortest && s;
                    while let Some(()) = pa.try_parse_array(|p, s, _| {
                        shortest = shortest && s;
                        let (id, s1) = p.parse::<u64>()?;
                        shortest = shortest && s1;
                        match id {
                            1 => {
                                let (v, s2) = p.parse::<u64>()?;
                                shortest = shortest && s2;
                                sha_variant = ShaVariant::try_from(v)?;
                            }
                            2 => {
                                let bytes = p.parse_value(|value, s2, tags| {
                                    shortest = shortest && s2 && tags.is_empty();
                                    match value {
                                        cbor::decode::Value::Bytes(r) => Ok(data[r].to_vec()),
                                        v => Err(Error::InvalidCBOR(
                                            cbor::decode::Error::IncorrectType(
                                                "Byte String".to_string(),
                                                v.type_name(!tags.is_empty()),
                                            ),
                                        )),
                                    }
                                })?;
                                wrapped_key = Some(bytes);
                            }
                            3 => {
                                let (v, s2) = p.parse::<u64>()?;
                                shortest = shortest && s2;
                                integrity_scope_flags = v.into();
                            }
                            id => return Err(Error::InvalidContextParameter(id)),
                        }
                        Ok::<_, Error>(())
                    })? {}
                    Ok::<_, Error>(())
                })
                .map_field_err("security context parameters")?;
            }

            let security_results = arr
                .parse_array(|ra, s, _| {
                    shortest = shortest && s;
                    let mut results = Vec::new();
                    while let Some(mac) = ra.try_parse_array(|per_target, s, _| {
                        shortest = shortest && s;
                        per_target.parse_array(|pair, s, _| {
                            shortest = shortest && s;
                            let (id, s1) = pair.parse::<u64>()?;
                            shortest = shortest && s1;
                            if id != 1 {
                                return Err(Error::InvalidContextResult(id));
                            }
                            pair.parse_value(|value, s2, tags| {
                                shortest = shortest && s2 && tags.is_empty();
                                match value {
                                    cbor::decode::Value::Bytes(r) => Ok(data[r].to_vec()),
                                    v => Err(Error::InvalidCBOR(cbor::decode::Error::IncorrectType(
                                        "Byte String".to_string(),
                                        v.type_name(!tags.is_empty()),
                                    ))),
                                }
                            })
                        })
                    })? {
                        results.push(mac);
                    }
                    Ok::<_, Error>(results)
                })
                .map_field_err("security results")?;

            if !security_results.is_empty() && security_results.len() != security_targets.len() {
                return Err(Error::MismatchedResults);
            }

            Ok((
                Bib {
                    security_targets,
                    security_source,
                    sha_variant,
                    integrity_scope_flags,
                    wrapped_key,
                    security_results,
                },
                shortest,
            ))
        })
        .map(|((v, s), len)| (v, s, len))
    }
}
