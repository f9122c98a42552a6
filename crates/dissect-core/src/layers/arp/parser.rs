use std::net::Ipv4Addr;

use crate::layers::common::ByteReader;
use crate::layers::common::format::{format_hw_addr, format_proto_addr, ipv4_from_slice};
use crate::layers::{DecodeError, DecodeFeedback, DecodingLayer, Layer, LayerType, NextLayer};

use super::layout;

/// ARP operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    Request,
    Reply,
    Other(u16),
}

impl From<u16> for ArpOperation {
    fn from(value: u16) -> Self {
        match value {
            layout::OPERATION_REQUEST => ArpOperation::Request,
            layout::OPERATION_REPLY => ArpOperation::Reply,
            other => ArpOperation::Other(other),
        }
    }
}

impl std::fmt::Display for ArpOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArpOperation::Request => f.write_str("request"),
            ArpOperation::Reply => f.write_str("reply"),
            ArpOperation::Other(code) => write!(f, "other({code})"),
        }
    }
}

/// Decoded ARP header. Address fields borrow from the decoded buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arp<'a> {
    hardware_type: u16,
    protocol_type: u16,
    hw_addr_len: u8,
    proto_addr_len: u8,
    operation: u16,
    source_hw_addr: &'a [u8],
    source_proto_addr: &'a [u8],
    dest_hw_addr: &'a [u8],
    dest_proto_addr: &'a [u8],
    contents: &'a [u8],
    payload: &'a [u8],
}

impl<'a> Arp<'a> {
    pub fn hardware_type(&self) -> u16 {
        self.hardware_type
    }

    pub fn protocol_type(&self) -> u16 {
        self.protocol_type
    }

    pub fn hw_addr_len(&self) -> u8 {
        self.hw_addr_len
    }

    pub fn proto_addr_len(&self) -> u8 {
        self.proto_addr_len
    }

    pub fn operation(&self) -> u16 {
        self.operation
    }

    pub fn operation_kind(&self) -> ArpOperation {
        ArpOperation::from(self.operation)
    }

    pub fn source_hw_addr(&self) -> &'a [u8] {
        self.source_hw_addr
    }

    pub fn source_proto_addr(&self) -> &'a [u8] {
        self.source_proto_addr
    }

    pub fn dest_hw_addr(&self) -> &'a [u8] {
        self.dest_hw_addr
    }

    pub fn dest_proto_addr(&self) -> &'a [u8] {
        self.dest_proto_addr
    }

    /// Sender protocol address, when it is a 4-byte IPv4 address.
    pub fn source_ipv4(&self) -> Option<Ipv4Addr> {
        ipv4_from_slice(self.source_proto_addr)
    }

    /// Target protocol address, when it is a 4-byte IPv4 address.
    pub fn dest_ipv4(&self) -> Option<Ipv4Addr> {
        ipv4_from_slice(self.dest_proto_addr)
    }
}

impl<'a> Layer<'a> for Arp<'a> {
    fn layer_type(&self) -> LayerType {
        LayerType::ARP
    }

    fn contents(&self) -> &'a [u8] {
        self.contents
    }

    fn payload(&self) -> &'a [u8] {
        self.payload
    }

    fn next_layer_type(&self) -> NextLayer {
        NextLayer::Terminal
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hardware_type", self.hardware_type.to_string()),
            ("protocol_type", format!("0x{:04x}", self.protocol_type)),
            ("hw_addr_len", self.hw_addr_len.to_string()),
            ("proto_addr_len", self.proto_addr_len.to_string()),
            ("operation", self.operation_kind().to_string()),
            ("source_hw_addr", format_hw_addr(self.source_hw_addr)),
            ("source_proto_addr", format_proto_addr(self.source_proto_addr)),
            ("dest_hw_addr", format_hw_addr(self.dest_hw_addr)),
            ("dest_proto_addr", format_proto_addr(self.dest_proto_addr)),
        ]
    }
}

impl<'a> DecodingLayer<'a> for Arp<'a> {
    fn decode_from_bytes(
        data: &'a [u8],
        feedback: &mut dyn DecodeFeedback,
    ) -> Result<Self, DecodeError> {
        let reader = ByteReader::new(data);
        reader.require_len(layout::FIXED_HEADER_LEN)?;

        let hardware_type = reader.read_u16_be(layout::HARDWARE_TYPE_OFFSET)?;
        let protocol_type = reader.read_u16_be(layout::PROTOCOL_TYPE_OFFSET)?;
        let hw_addr_len = reader.read_u8(layout::HW_ADDR_LEN_OFFSET)?;
        let proto_addr_len = reader.read_u8(layout::PROTO_ADDR_LEN_OFFSET)?;
        let operation = reader.read_u16_be(layout::OPERATION_OFFSET)?;

        let header_len = layout::header_len(hw_addr_len, proto_addr_len);
        reader.require_len(header_len)?;

        let ranges = layout::address_ranges(hw_addr_len, proto_addr_len);
        let source_hw_addr = reader.read_slice(ranges.source_hw)?;
        let source_proto_addr = reader.read_slice(ranges.source_proto)?;
        let dest_hw_addr = reader.read_slice(ranges.dest_hw)?;
        let dest_proto_addr = reader.read_slice(ranges.dest_proto)?;
        let (contents, payload) = reader.split_at(header_len)?;

        report_address_family_mismatch(
            hardware_type,
            protocol_type,
            hw_addr_len,
            proto_addr_len,
            feedback,
        );

        Ok(Arp {
            hardware_type,
            protocol_type,
            hw_addr_len,
            proto_addr_len,
            operation,
            source_hw_addr,
            source_proto_addr,
            dest_hw_addr,
            dest_proto_addr,
            contents,
            payload,
        })
    }

    fn can_decode() -> &'static [LayerType] {
        &[LayerType::ARP]
    }
}

fn report_address_family_mismatch(
    hardware_type: u16,
    protocol_type: u16,
    hw_addr_len: u8,
    proto_addr_len: u8,
    feedback: &mut dyn DecodeFeedback,
) {
    if hardware_type == layout::HARDWARE_TYPE_ETHERNET && hw_addr_len != layout::ETHERNET_ADDR_LEN
    {
        feedback.report_anomaly(&format!(
            "arp: ethernet hardware type declares {hw_addr_len}-byte hardware addresses"
        ));
    }
    if protocol_type == layout::PROTOCOL_TYPE_IPV4 && proto_addr_len != layout::IPV4_ADDR_LEN {
        feedback.report_anomaly(&format!(
            "arp: ipv4 protocol type declares {proto_addr_len}-byte protocol addresses"
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::{Arp, ArpOperation};
    use crate::layers::arp::layout;
    use crate::layers::{
        CollectingFeedback, DecodeError, DecodingLayer, Layer, LayerType, NextLayer, NoopFeedback,
    };

    const REQUEST: [u8; 28] = [
        0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0xc0,
        0xa8, 0x00, 0x01, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0xc0, 0xa8, 0x00, 0x02,
    ];

    #[test]
    fn parse_valid_request() {
        let arp = Arp::decode_from_bytes(&REQUEST, &mut NoopFeedback).unwrap();
        assert_eq!(arp.hardware_type(), 1);
        assert_eq!(arp.protocol_type(), 0x0800);
        assert_eq!(arp.hw_addr_len(), 6);
        assert_eq!(arp.proto_addr_len(), 4);
        assert_eq!(arp.operation(), 1);
        assert_eq!(arp.operation_kind(), ArpOperation::Request);
        assert_eq!(arp.source_hw_addr(), &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(arp.source_ipv4(), Some(Ipv4Addr::new(192, 168, 0, 1)));
        assert_eq!(arp.dest_hw_addr(), &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(arp.dest_ipv4(), Some(Ipv4Addr::new(192, 168, 0, 2)));
        assert_eq!(arp.contents().len(), 28);
        assert!(arp.payload().is_empty());
        assert_eq!(arp.next_layer_type(), NextLayer::Terminal);
        assert_eq!(arp.layer_type(), LayerType::ARP);
    }

    #[test]
    fn address_fields_occupy_exact_ranges() {
        let arp = Arp::decode_from_bytes(&REQUEST, &mut NoopFeedback).unwrap();
        let ranges = layout::address_ranges(6, 4);
        assert_eq!(arp.source_hw_addr(), &REQUEST[ranges.source_hw]);
        assert_eq!(arp.source_proto_addr(), &REQUEST[ranges.source_proto]);
        assert_eq!(arp.dest_hw_addr(), &REQUEST[ranges.dest_hw]);
        assert_eq!(arp.dest_proto_addr(), &REQUEST[ranges.dest_proto]);
    }

    #[test]
    fn views_borrow_from_input() {
        let data = REQUEST.to_vec();
        let arp = Arp::decode_from_bytes(&data, &mut NoopFeedback).unwrap();
        assert!(std::ptr::eq(arp.contents().as_ptr(), data.as_ptr()));
        assert!(std::ptr::eq(arp.source_hw_addr().as_ptr(), data[8..].as_ptr()));
    }

    #[test]
    fn trailing_bytes_become_payload() {
        let mut data = REQUEST.to_vec();
        data.extend_from_slice(&[0u8; 18]);
        let arp = Arp::decode_from_bytes(&data, &mut NoopFeedback).unwrap();
        assert_eq!(arp.contents().len(), 28);
        assert_eq!(arp.payload().len(), 18);
    }

    #[test]
    fn every_prefix_is_truncated() {
        for len in 0..REQUEST.len() {
            let err = Arp::decode_from_bytes(&REQUEST[..len], &mut NoopFeedback).unwrap_err();
            assert!(
                matches!(err, DecodeError::Truncated { actual, .. } if actual == len),
                "prefix of {len} bytes: {err:?}"
            );
        }
    }

    #[test]
    fn short_fixed_header_reports_fixed_len() {
        let err = Arp::decode_from_bytes(&REQUEST[..5], &mut NoopFeedback).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                needed: layout::FIXED_HEADER_LEN,
                actual: 5
            }
        );
    }

    #[test]
    fn oversized_lengths_are_truncated_before_address_reads() {
        let mut data = REQUEST;
        data[4] = 0xff;
        data[5] = 0xff;
        let err = Arp::decode_from_bytes(&data, &mut NoopFeedback).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                needed: layout::header_len(0xff, 0xff),
                actual: 28
            }
        );
    }

    #[test]
    fn zero_length_addresses() {
        let data = [0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x02];
        let arp = Arp::decode_from_bytes(&data, &mut NoopFeedback).unwrap();
        assert!(arp.source_hw_addr().is_empty());
        assert!(arp.dest_proto_addr().is_empty());
        assert_eq!(arp.operation_kind(), ArpOperation::Reply);
        assert_eq!(arp.contents().len(), 8);
    }

    #[test]
    fn mismatched_lengths_report_anomalies() {
        let data = [
            0x00, 0x01, 0x08, 0x00, 0x08, 0x02, 0x00, 0x01, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
            13, 14, 15, 16, 17, 18, 19, 20,
        ];
        let mut feedback = CollectingFeedback::new();
        let arp = Arp::decode_from_bytes(&data, &mut feedback).unwrap();
        assert_eq!(arp.contents().len(), layout::header_len(8, 2));
        assert_eq!(feedback.anomalies().len(), 2);
        assert!(feedback.anomalies()[0].contains("8-byte hardware"));
        assert!(feedback.anomalies()[1].contains("2-byte protocol"));
        assert_eq!(arp.source_ipv4(), None);
    }

    #[test]
    fn well_formed_request_reports_nothing() {
        let mut feedback = CollectingFeedback::new();
        Arp::decode_from_bytes(&REQUEST, &mut feedback).unwrap();
        assert!(feedback.is_empty());
    }

    #[test]
    fn decoding_twice_is_identical() {
        let first = Arp::decode_from_bytes(&REQUEST, &mut NoopFeedback).unwrap();
        let second = Arp::decode_from_bytes(&REQUEST, &mut NoopFeedback).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn describe_formats_addresses() {
        let arp = Arp::decode_from_bytes(&REQUEST, &mut NoopFeedback).unwrap();
        let fields = arp.describe();
        assert!(fields.contains(&("operation", "request".to_string())));
        assert!(fields.contains(&("source_hw_addr", "aa:bb:cc:dd:ee:ff".to_string())));
        assert!(fields.contains(&("dest_proto_addr", "192.168.0.2".to_string())));
        assert!(fields.contains(&("protocol_type", "0x0800".to_string())));
    }

    #[test]
    fn unknown_operation_is_preserved() {
        assert_eq!(ArpOperation::from(9), ArpOperation::Other(9));
        assert_eq!(ArpOperation::Other(9).to_string(), "other(9)");
    }
}
