/// Destination (6) + source (6) + EtherType (2).
pub const HEADER_LEN: usize = 14;

pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_IPV6: u16 = 0x86dd;

/// Values below this are IEEE 802.3 length fields, not EtherTypes.
pub const MIN_ETHER_TYPE: u16 = 0x0600;
