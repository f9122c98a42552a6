use std::net::Ipv4Addr;

/// Render a hardware address as colon-separated lower-case hex.
pub fn format_hw_addr(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":")
}

/// Render a protocol address: dotted quad for 4-byte addresses, hex otherwise.
pub fn format_proto_addr(bytes: &[u8]) -> String {
    match ipv4_from_slice(bytes) {
        Some(addr) => addr.to_string(),
        None => hex::encode(bytes),
    }
}

pub fn ipv4_from_slice(bytes: &[u8]) -> Option<Ipv4Addr> {
    let octets: [u8; 4] = bytes.try_into().ok()?;
    Some(Ipv4Addr::from(octets))
}
