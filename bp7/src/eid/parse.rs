use super::*;

pub fn eid_from_str(s: &str) -> Result<Eid, EidError> {
    let Some((scheme, ssp)) = s.split_once(':') else {
        return Err(EidError::MissingScheme);
    };
    match scheme {
        "dtn" => {
            if ssp == "none" {
                return Ok(Eid::Null);
            }
            if ssp.is_empty() {
                return Err(EidError::DtnSspEmpty);
            }
            Ok(Eid::Dtn {
                ssp: ssp.to_string(),
            })
        }
        "ipn" => {
            let Some((node, service)) = ssp.split_once('.') else {
                return Err(EidError::InvalidIpnComponents);
            };
            if node.is_empty() || service.is_empty() || node.contains('.') || service.contains('.')
            {
                return Err(EidError::InvalidIpnComponents);
            }
            let node = node
                .parse::<u64>()
                .map_err(|_| EidError::InvalidIpnComponents)?;
            let service = service
                .parse::<u64>()
                .map_err(|_| EidError::InvalidIpnComponents)?;
            Ok(Eid::Ipn { node, service })
        }
        other => Err(EidError::UnsupportedScheme(other.to_string())),
    }
}

pub fn eid_from_cbor(data: &[u8]) -> Result<(Eid, bool, usize), EidError> {
    cbor::decode::parse_array(data, |a, shortest, tags| {
        if !tags.is_empty() {
            return Err(cbor::decode::Error::IncorrectType(
                "untagged EID".to_string(),
                "tagged value".to_string(),
            )
            .into());
        }
        let (scheme, scheme_shortest) = a.parse::<u64>()?;
        let (eid, value_shortest) = match scheme {
            1 => a.parse_value(|value, s, _| match value {
                cbor::decode::Value::UnsignedInteger(0) => Ok((Eid::Null, s)),
                cbor::decode::Value::Text(ssp) => {
                    if ssp.is_empty() {
                        return Err(EidError::DtnSspEmpty);
                    }
                    Ok((Eid::Dtn { ssp: ssp.to_string() }, s))
                }
                v => Err(EidError::InvalidCBOR(cbor::decode::Error::IncorrectType(
                    "0 or dtn ssp text string".to_string(),
                    v.type_name(false),
                ))),
            })?,
            2 => a.parse_array(|a, s, _| {
                let (node, s1) = a.parse::<u64>()?;
                let (service, s2) = a.parse::<u64>()?;
                Ok::<_, EidError>((Eid::Ipn { node, service }, s && s1 && s2))
            })?,
            scheme => return Err(EidError::UnrecognisedScheme(scheme)),
        };
        Ok((eid, shortest && scheme_shortest && value_shortest))
    })
    .map(|((eid, s), len)| (eid, s, len))
}
