use super::*;
use alloc::string::ToString;

fn key(fill: u8) -> Vec<u8> {
    vec![fill; 32]
}

#[test]
fn seal_then_verify_succeeds() {
    let mut bib = Bib::new(eid::Eid::Null, vec![1]);
    bib.sha_variant = ShaVariant::HMAC_384;

    let own_flags = block::BlockFlags::default();
    let primary_bytes = b"primary-block-bytes".to_vec();
    let targets = vec![(b"target-header".to_vec(), b"target-content".to_vec())];

    bib.seal(&key(0x42), 2, &own_flags, &primary_bytes, &targets)
        .unwrap();
    assert!(bib.is_sealed());
    assert_eq!(bib.security_results.len(), 1);
    assert_eq!(bib.security_results[0].len(), ShaVariant::HMAC_384.mac_len());

    bib.verify(&key(0x42), 2, &own_flags, &primary_bytes, &targets)
        .unwrap();
}

#[test]
fn verify_with_wrong_key_fails() {
    let mut bib = Bib::new(eid::Eid::Null, vec![1]);
    bib.sha_variant = ShaVariant::HMAC_256;

    let own_flags = block::BlockFlags::default();
    let primary_bytes = b"primary-block-bytes".to_vec();
    let targets = vec![(b"target-header".to_vec(), b"target-content".to_vec())];

    bib.seal(&key(0), 2, &own_flags, &primary_bytes, &targets)
        .unwrap();

    let result = bib.verify(&key(1), 2, &own_flags, &primary_bytes, &targets);
    assert!(matches!(result, Err(Error::IntegrityMismatch)));
}

#[test]
fn verify_after_primary_bytes_change_fails() {
    let mut bib = Bib::new(eid::Eid::Null, vec![1]);
    let own_flags = block::BlockFlags::default();
    let targets = vec![(b"target-header".to_vec(), b"target-content".to_vec())];

    bib.seal(&key(7), 2, &own_flags, b"primary-v1", &targets)
        .unwrap();

    let result = bib.verify(&key(7), 2, &own_flags, b"primary-v2", &targets);
    assert!(matches!(result, Err(Error::IntegrityMismatch)));
}

#[test]
fn seal_with_no_targets_fails() {
    let mut bib = Bib::new(eid::Eid::Null, vec![]);
    let result = bib.seal(&key(0), 2, &block::BlockFlags::default(), b"primary", &[]);
    assert!(matches!(result, Err(Error::NoTargets)));
}

#[test]
fn seal_with_mismatched_target_count_fails() {
    let mut bib = Bib::new(eid::Eid::Null, vec![1, 2]);
    let result = bib.seal(
        &key(0),
        3,
        &block::BlockFlags::default(),
        b"primary",
        &[(b"h".to_vec(), b"c".to_vec())],
    );
    assert!(matches!(result, Err(Error::MismatchedResults)));
}

#[test]
fn mac_lengths_match_sha_variant() {
    assert_eq!(ShaVariant::HMAC_256.mac_len(), 32);
    assert_eq!(ShaVariant::HMAC_384.mac_len(), 48);
    assert_eq!(ShaVariant::HMAC_512.mac_len(), 64);
}

#[test]
fn cbor_roundtrip_unsigned_default_parameters() {
    let bib = Bib::new(eid::Eid::Dtn { ssp: "//node1/sec".to_string() }, vec![1]);
    let (data, _) = cbor::encode::emit(&bib);
    let decoded: Bib = cbor::decode::parse(&data).unwrap();
    assert_eq!(decoded, bib);
}

#[test]
fn cbor_roundtrip_sealed_with_non_default_parameters() {
    let mut bib = Bib::new(eid::Eid::Null, vec![1, 3]);
    bib.sha_variant = ShaVariant::HMAC_256;
    bib.integrity_scope_flags = IntegrityScopeFlags {
        include_primary_block: true,
        include_target_header: false,
        include_security_header: true,
    };
    let own_flags = block::BlockFlags::default();
    let targets = vec![
        (b"h1".to_vec(), b"c1".to_vec()),
        (b"h2".to_vec(), b"c2".to_vec()),
    ];
    bib.seal(&key(9), 2, &own_flags, b"primary", &targets).unwrap();

    let (data, _) = cbor::encode::emit(&bib);
    let decoded: Bib = cbor::decode::parse(&data).unwrap();
    assert_eq!(decoded, bib);
}

#[test]
fn ippt_is_stable_across_equal_inputs() {
    let mut bib_a = Bib::new(eid::Eid::Null, vec![1]);
    let mut bib_b = Bib::new(eid::Eid::Null, vec![1]);
    let own_flags = block::BlockFlags::default();
    let targets = vec![(b"header".to_vec(), b"content".to_vec())];

    bib_a
        .seal(&key(0xAA), 2, &own_flags, b"primary", &targets)
        .unwrap();
    bib_b
        .seal(&key(0xAA), 2, &own_flags, b"primary", &targets)
        .unwrap();

    assert_eq!(bib_a.security_results, bib_b.security_results);
}
