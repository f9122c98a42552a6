use std::ops::Range;

pub const HARDWARE_TYPE_OFFSET: usize = 0;
pub const PROTOCOL_TYPE_OFFSET: usize = 2;
pub const HW_ADDR_LEN_OFFSET: usize = 4;
pub const PROTO_ADDR_LEN_OFFSET: usize = 5;
pub const OPERATION_OFFSET: usize = 6;

pub const FIXED_HEADER_LEN: usize = 8;

pub const HARDWARE_TYPE_ETHERNET: u16 = 0x0001;
pub const PROTOCOL_TYPE_IPV4: u16 = 0x0800;
pub const ETHERNET_ADDR_LEN: u8 = 6;
pub const IPV4_ADDR_LEN: u8 = 4;

pub const OPERATION_REQUEST: u16 = 1;
pub const OPERATION_REPLY: u16 = 2;

/// Full header length implied by the two address-length fields.
///
/// At most `8 + 2 * 255 + 2 * 255`, so this never overflows.
pub const fn header_len(hw_addr_len: u8, proto_addr_len: u8) -> usize {
    FIXED_HEADER_LEN + 2 * hw_addr_len as usize + 2 * proto_addr_len as usize
}

/// Byte ranges of the four variable-length address fields, packed without
/// gaps after the fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRanges {
    pub source_hw: Range<usize>,
    pub source_proto: Range<usize>,
    pub dest_hw: Range<usize>,
    pub dest_proto: Range<usize>,
}

pub fn address_ranges(hw_addr_len: u8, proto_addr_len: u8) -> AddressRanges {
    let hw = hw_addr_len as usize;
    let proto = proto_addr_len as usize;
    let source_hw = FIXED_HEADER_LEN..FIXED_HEADER_LEN + hw;
    let source_proto = source_hw.end..source_hw.end + proto;
    let dest_hw = source_proto.end..source_proto.end + hw;
    let dest_proto = dest_hw.end..dest_hw.end + proto;
    AddressRanges {
        source_hw,
        source_proto,
        dest_hw,
        dest_proto,
    }
}

#[cfg(test)]
mod tests {
    use super::{address_ranges, header_len};

    #[test]
    fn ethernet_ipv4_ranges() {
        let ranges = address_ranges(6, 4);
        assert_eq!(ranges.source_hw, 8..14);
        assert_eq!(ranges.source_proto, 14..18);
        assert_eq!(ranges.dest_hw, 18..24);
        assert_eq!(ranges.dest_proto, 24..28);
        assert_eq!(ranges.dest_proto.end, header_len(6, 4));
    }

    #[test]
    fn max_lengths_do_not_overflow() {
        assert_eq!(header_len(u8::MAX, u8::MAX), 8 + 4 * 255);
        assert_eq!(address_ranges(u8::MAX, u8::MAX).dest_proto.end, 1028);
    }

    #[test]
    fn zero_lengths_collapse_to_fixed_header() {
        let ranges = address_ranges(0, 0);
        assert!(ranges.source_hw.is_empty());
        assert_eq!(ranges.dest_proto, 8..8);
        assert_eq!(header_len(0, 0), 8);
    }
}
