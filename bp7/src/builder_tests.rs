use super::*;
use core::str::FromStr;

fn node(s: &str) -> Eid {
    Eid::from_str(s).unwrap()
}

#[test]
fn missing_destination_is_builder_incomplete() {
    let result = Builder::new().add_payload_block(vec![1, 2]).build();
    assert!(matches!(result, Err(Error::BuilderIncomplete("destination"))));
}

#[test]
fn missing_payload_is_builder_incomplete() {
    let result = Builder::new()
        .destination(node("dtn://node2/inbox"))
        .build();
    assert!(matches!(result, Err(Error::BuilderIncomplete("payload"))));
}

#[test]
fn report_to_defaults_to_source() {
    let bundle = Builder::new()
        .source(node("dtn://node1/out"))
        .destination(node("dtn://node2/inbox"))
        .add_payload_block(vec![1])
        .build()
        .unwrap();
    assert_eq!(bundle.report_to, node("dtn://node1/out"));
}

#[test]
fn extension_blocks_are_numbered_sequentially_from_two() {
    let bundle = Builder::new()
        .destination(node("dtn://node2/inbox"))
        .add_payload_block(vec![1])
        .add_hop_count_block(30)
        .build()
        .add_bundle_age_block(0)
        .build()
        .build()
        .unwrap();

    assert_eq!(bundle.payload_block().unwrap().number, 1);
    assert_eq!(bundle.blocks.len(), 3);
    let numbers: alloc::vec::Vec<u64> = bundle.blocks.iter().map(|b| b.number).collect();
    assert_eq!(numbers, alloc::vec![1, 2, 3]);
}

#[test]
fn explicit_block_number_overrides_sequential_assignment() {
    let bundle = Builder::new()
        .destination(node("dtn://node2/inbox"))
        .add_payload_block(vec![1])
        .add_hop_count_block(10)
        .block_number(5)
        .build()
        .build()
        .unwrap();
    assert_eq!(bundle.block_by_number(5).unwrap().block_type(), block::Type::HopCount);
}

#[test]
fn duplicate_explicit_block_numbers_rejected_at_build() {
    let result = Builder::new()
        .destination(node("dtn://node2/inbox"))
        .add_payload_block(vec![1])
        .add_hop_count_block(10)
        .block_number(2)
        .build()
        .add_bundle_age_block(0)
        .block_number(2)
        .build()
        .build();
    assert!(matches!(result, Err(Error::DuplicateBlockNumber(2))));
}

#[test]
fn default_crc_type_is_applied_to_all_blocks() {
    let bundle = Builder::new()
        .destination(node("dtn://node2/inbox"))
        .add_payload_block(vec![1])
        .add_hop_count_block(10)
        .build()
        .build()
        .unwrap();
    assert!(matches!(bundle.crc_type, crc::CrcType::CRC32_CASTAGNOLI));
    for b in &bundle.blocks {
        assert!(matches!(b.crc_type, crc::CrcType::CRC32_CASTAGNOLI));
    }
}
