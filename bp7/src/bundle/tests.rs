use super::*;
use core::str::FromStr;

fn node(s: &str) -> eid::Eid {
    eid::Eid::from_str(s).unwrap()
}

fn s1_bundle() -> Bundle {
    Builder::new()
        .source(node("dtn://node1/out"))
        .destination(node("dtn://node2/inbox"))
        .report_to(eid::Eid::Null)
        .timestamp(creation_timestamp::CreationTimestamp::from_parts(None, 0))
        .lifetime(core::time::Duration::from_millis(3_600_000))
        .crc_type(crc::CrcType::CRC32_CASTAGNOLI)
        .add_payload_block(alloc::vec![0x48, 0x69])
        .build()
        .unwrap()
}

#[test]
fn s1_builds_and_validates() {
    let bundle = s1_bundle();
    bundle.validate().unwrap();
    assert_eq!(bundle.payload(), Some(&[0x48, 0x69][..]));
}

#[test]
fn s2_corrupted_payload_byte_fails_crc() {
    let bundle = s1_bundle();
    let mut encoded = bundle.encode().unwrap();

    let at = encoded
        .windows(2)
        .position(|w| w == [0x48, 0x69])
        .expect("payload bytes present in encoded bundle");
    encoded[at + 1] = 0x00;

    let result = Bundle::decode(&encoded);
    assert!(matches!(result, Err(Error::InvalidCrc(crc::Error::IncorrectCrc))));
}

#[test]
fn s3_seal_and_verify_succeeds() {
    let mut bundle = Builder::new()
        .source(node("dtn://node1/out"))
        .destination(node("dtn://node2/inbox"))
        .report_to(eid::Eid::Null)
        .timestamp(creation_timestamp::CreationTimestamp::from_parts(None, 0))
        .lifetime(core::time::Duration::from_millis(3_600_000))
        .add_payload_block(alloc::vec![0x48, 0x69])
        .add_integrity_block(node("dtn://node1/out"), alloc::vec![1])
        .build()
        .build()
        .unwrap();

    let key: alloc::vec::Vec<u8> = (0u8..32).collect();
    bundle.seal_integrity_block(2, &key).unwrap();
    bundle.verify_integrity_block(2, &key).unwrap();

    let block::BlockData::Integrity(bib) = &bundle.block_by_number(2).unwrap().data else {
        panic!("block 2 is not an integrity block");
    };
    assert_eq!(bib.sha_variant, bpsec::ShaVariant::HMAC_384);
    assert_eq!(bib.security_results[0].len(), 48);
}

#[test]
fn s4_modifying_primary_after_seal_fails_verify() {
    let mut bundle = Builder::new()
        .source(node("dtn://node1/out"))
        .destination(node("dtn://node2/inbox"))
        .report_to(eid::Eid::Null)
        .timestamp(creation_timestamp::CreationTimestamp::from_parts(None, 0))
        .lifetime(core::time::Duration::from_millis(3_600_000))
        .add_payload_block(alloc::vec![0x48, 0x69])
        .add_integrity_block(node("dtn://node1/out"), alloc::vec![1])
        .build()
        .build()
        .unwrap();

    let key: alloc::vec::Vec<u8> = (0u8..32).collect();
    bundle.seal_integrity_block(2, &key).unwrap();

    bundle.lifetime = core::time::Duration::from_millis(3_600_001);

    let result = bundle.verify_integrity_block(2, &key);
    assert!(matches!(result, Err(Error::InvalidBPSec(bpsec::Error::IntegrityMismatch))));
}

#[test]
fn s5_duplicate_block_number_rejected() {
    let mut bundle = s1_bundle();
    bundle.blocks.push(block::CanonicalBlock::new(
        2,
        block::BlockFlags::default(),
        crc::CrcType::None,
        block::BlockData::BundleAge(0),
    ));
    bundle.blocks.push(block::CanonicalBlock::new(
        2,
        block::BlockFlags::default(),
        crc::CrcType::None,
        block::BlockData::HopCount { limit: 5, count: 0 },
    ));

    assert!(matches!(bundle.validate(), Err(Error::DuplicateBlockNumber(2))));
}

#[test]
fn round_trip_preserves_bundle_shape() {
    let bundle = s1_bundle();
    let encoded = bundle.encode().unwrap();
    let decoded = Bundle::decode(&encoded).unwrap();

    assert_eq!(decoded.id, bundle.id);
    assert_eq!(decoded.destination, bundle.destination);
    assert_eq!(decoded.report_to, bundle.report_to);
    assert_eq!(decoded.lifetime, bundle.lifetime);
    assert_eq!(decoded.payload(), bundle.payload());
    assert_eq!(decoded.blocks.len(), bundle.blocks.len());
}

#[test]
fn set_crc_is_idempotent_and_removable() {
    let mut bundle = s1_bundle();
    bundle.set_crc(crc::CrcType::CRC16_X25);
    let once = bundle.encode().unwrap();
    bundle.set_crc(crc::CrcType::CRC16_X25);
    let twice = bundle.encode().unwrap();
    assert_eq!(once, twice);

    bundle.set_crc(crc::CrcType::None);
    let no_crc = Bundle::decode(&bundle.encode().unwrap()).unwrap();
    assert!(matches!(no_crc.crc_type, crc::CrcType::None));
    for b in &no_crc.blocks {
        assert!(matches!(b.crc_type, crc::CrcType::None));
    }
}

#[test]
fn missing_security_target_rejected() {
    let mut bundle = s1_bundle();
    bundle.blocks.push(block::CanonicalBlock::new(
        2,
        block::BlockFlags::default(),
        crc::CrcType::None,
        block::BlockData::Integrity(bpsec::bib::Bib::new(eid::Eid::Null, alloc::vec![99])),
    ));
    assert!(matches!(
        bundle.validate(),
        Err(Error::InvalidBPSec(bpsec::Error::MissingSecurityTarget(99)))
    ));
}

#[test]
fn missing_payload_block_rejected() {
    let mut bundle = s1_bundle();
    bundle.blocks.clear();
    bundle.blocks.push(block::CanonicalBlock::new_unknown(
        1,
        200,
        block::BlockFlags::default(),
        crc::CrcType::None,
        alloc::vec![1, 2, 3],
    ));
    assert!(matches!(bundle.validate(), Err(Error::MissingPayloadBlock)));
}

#[test]
fn payload_block_not_at_number_one_rejected() {
    let mut bundle = s1_bundle();
    bundle.blocks.clear();
    bundle.blocks.push(block::CanonicalBlock::new(
        3,
        block::BlockFlags::default(),
        crc::CrcType::None,
        block::BlockData::Payload(alloc::vec![0x48, 0x69]),
    ));
    assert!(matches!(
        bundle.validate(),
        Err(Error::InvalidBlockNumber(3, block::Type::Payload))
    ));
}
