use super::*;
use cbor::decode::FromCbor;
use cbor::encode;

fn roundtrip(eid: &Eid) {
    let (data, _) = encode::emit(eid);
    let (decoded, shortest, len) = Eid::from_cbor(&data).unwrap();
    assert_eq!(&decoded, eid);
    assert!(shortest);
    assert_eq!(len, data.len());
}

#[test]
fn null_roundtrip() {
    roundtrip(&Eid::Null);
}

#[test]
fn dtn_roundtrip() {
    roundtrip(&Eid::Dtn {
        ssp: "//node2/inbox".to_string(),
    });
}

#[test]
fn ipn_roundtrip() {
    roundtrip(&Eid::Ipn {
        node: 5,
        service: 12,
    });
}

#[test]
fn unrecognised_scheme_rejected() {
    let data = encode::emit_array(Some(2), |a| {
        a.emit(&3u64);
        a.emit(&0u64);
    });
    assert!(matches!(
        Eid::from_cbor(&data),
        Err(EidError::UnrecognisedScheme(3))
    ));
}
