use super::*;
use core::str::FromStr;

#[test]
fn dtn_none() {
    assert_eq!(Eid::from_str("dtn:none").unwrap(), Eid::Null);
    assert_eq!(Eid::Null.to_string(), "dtn:none");
}

#[test]
fn dtn_address() {
    let eid = Eid::from_str("dtn://a/b").unwrap();
    assert_eq!(
        eid,
        Eid::Dtn {
            ssp: "//a/b".to_string()
        }
    );
    assert_eq!(eid.to_string(), "dtn://a/b");
}

#[test]
fn dtn_empty_ssp() {
    assert!(matches!(
        Eid::from_str("dtn:"),
        Err(EidError::DtnSspEmpty)
    ));
}

#[test]
fn ipn_two_component() {
    assert_eq!(
        Eid::from_str("ipn:5.12").unwrap(),
        Eid::Ipn { node: 5, service: 12 }
    );
}

#[test]
fn ipn_missing_service() {
    assert!(matches!(
        Eid::from_str("ipn:5"),
        Err(EidError::InvalidIpnComponents)
    ));
}

#[test]
fn unsupported_scheme() {
    assert!(matches!(
        Eid::from_str("http://x"),
        Err(EidError::UnsupportedScheme(_))
    ));
}

#[test]
fn missing_scheme() {
    assert!(matches!(Eid::from_str("nocolonhere"), Err(EidError::MissingScheme)));
}
