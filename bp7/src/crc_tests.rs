use super::*;

#[test]
fn crc16_x25_check_value() {
    // Catalog check value for CRC-16/X-25 over ASCII "123456789".
    let mut digest = X25.digest();
    digest.update(b"123456789");
    assert_eq!(digest.finalize(), 0x906E);
}

#[test]
fn crc32_castagnoli_check_value() {
    // Catalog check value for CRC-32/ISCSI (Castagnoli) over ASCII "123456789".
    let mut digest = CASTAGNOLI.digest();
    digest.update(b"123456789");
    assert_eq!(digest.finalize(), 0xE3069283);
}

fn parse_two_element_array_with_crc(
    with_crc: &[u8],
    crc_type: CrcType,
) -> Result<((), bool), Error> {
    cbor::decode::parse_array(with_crc, |a, s, _| {
        let (_first, s1) = a.parse::<u64>()?;
        let (_second, s2) = a.parse::<u64>()?;
        let shortest = parse_crc_value(with_crc, a, crc_type)? && s && s1 && s2;
        Ok(((), shortest))
    })
    .map(|(v, _len)| v)
}

#[test]
fn append_then_parse_crc16_roundtrips() {
    let body = cbor::encode::emit_array(Some(3), |a| {
        a.emit(&1u64);
        a.emit(&2u64);
        a.skip_value();
    });
    let with_crc = append_crc_value(CrcType::CRC16_X25, body).unwrap();

    let ((), shortest) =
        parse_two_element_array_with_crc(&with_crc, CrcType::CRC16_X25).unwrap();
    assert!(shortest);
}

#[test]
fn append_then_parse_crc32_roundtrips() {
    let body = cbor::encode::emit_array(Some(3), |a| {
        a.emit(&1u64);
        a.emit(&2u64);
        a.skip_value();
    });
    let with_crc = append_crc_value(CrcType::CRC32_CASTAGNOLI, body).unwrap();

    let ((), shortest) =
        parse_two_element_array_with_crc(&with_crc, CrcType::CRC32_CASTAGNOLI).unwrap();
    assert!(shortest);
}

#[test]
fn corrupted_crc_is_rejected() {
    let body = cbor::encode::emit_array(Some(3), |a| {
        a.emit(&1u64);
        a.emit(&2u64);
        a.skip_value();
    });
    let mut with_crc = append_crc_value(CrcType::CRC32_CASTAGNOLI, body).unwrap();
    let last = with_crc.len() - 1;
    with_crc[last] ^= 0xFF;

    let result = parse_two_element_array_with_crc(&with_crc, CrcType::CRC32_CASTAGNOLI);
    assert!(matches!(result, Err(Error::IncorrectCrc)));
}

#[test]
fn zeroed_crc_bytes_are_correctly_sized() {
    assert!(zeroed_crc_bytes(CrcType::None).is_empty());
    assert_eq!(zeroed_crc_bytes(CrcType::CRC16_X25).len(), 3);
    assert_eq!(zeroed_crc_bytes(CrcType::CRC32_CASTAGNOLI).len(), 5);
}
