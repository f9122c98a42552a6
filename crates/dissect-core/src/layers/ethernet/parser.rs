use etherparse::Ethernet2HeaderSlice;

use crate::layers::common::ByteReader;
use crate::layers::common::format::format_hw_addr;
use crate::layers::{DecodeError, DecodeFeedback, DecodingLayer, Layer, LayerType, NextLayer};

use super::layout;

/// Decoded Ethernet II header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ethernet<'a> {
    destination: [u8; 6],
    source: [u8; 6],
    ether_type: u16,
    contents: &'a [u8],
    payload: &'a [u8],
}

impl<'a> Ethernet<'a> {
    pub fn destination(&self) -> [u8; 6] {
        self.destination
    }

    pub fn source(&self) -> [u8; 6] {
        self.source
    }

    pub fn ether_type(&self) -> u16 {
        self.ether_type
    }
}

impl<'a> Layer<'a> for Ethernet<'a> {
    fn layer_type(&self) -> LayerType {
        LayerType::ETHERNET
    }

    fn contents(&self) -> &'a [u8] {
        self.contents
    }

    fn payload(&self) -> &'a [u8] {
        self.payload
    }

    fn next_layer_type(&self) -> NextLayer {
        match self.ether_type {
            layout::ETHER_TYPE_ARP => NextLayer::Layer(LayerType::ARP),
            layout::ETHER_TYPE_IPV4 => NextLayer::Layer(LayerType::IPV4),
            layout::ETHER_TYPE_IPV6 => NextLayer::Layer(LayerType::IPV6),
            _ => NextLayer::Terminal,
        }
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("destination", format_hw_addr(&self.destination)),
            ("source", format_hw_addr(&self.source)),
            ("ether_type", format!("0x{:04x}", self.ether_type)),
        ]
    }
}

impl<'a> DecodingLayer<'a> for Ethernet<'a> {
    fn decode_from_bytes(
        data: &'a [u8],
        feedback: &mut dyn DecodeFeedback,
    ) -> Result<Self, DecodeError> {
        let reader = ByteReader::new(data);
        reader.require_len(layout::HEADER_LEN)?;

        let header = Ethernet2HeaderSlice::from_slice(data).map_err(|_| DecodeError::Truncated {
            needed: layout::HEADER_LEN,
            actual: data.len(),
        })?;
        let ether_type = header.ether_type().0;
        if ether_type < layout::MIN_ETHER_TYPE {
            feedback.report_anomaly(&format!(
                "ethernet: type field 0x{ether_type:04x} is an 802.3 length, not an EtherType"
            ));
        }

        let (contents, payload) = reader.split_at(layout::HEADER_LEN)?;
        Ok(Ethernet {
            destination: header.destination(),
            source: header.source(),
            ether_type,
            contents,
            payload,
        })
    }

    fn can_decode() -> &'static [LayerType] {
        &[LayerType::ETHERNET]
    }
}

#[cfg(test)]
mod tests {
    use etherparse::PacketBuilder;

    use super::Ethernet;
    use crate::layers::ethernet::layout;
    use crate::layers::{
        CollectingFeedback, DecodeError, DecodingLayer, Layer, LayerType, NextLayer, NoopFeedback,
    };

    fn frame(ether_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        data.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        data.extend_from_slice(&ether_type.to_be_bytes());
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn parse_arp_frame() {
        let data = frame(layout::ETHER_TYPE_ARP, &[1, 2, 3]);
        let eth = Ethernet::decode_from_bytes(&data, &mut NoopFeedback).unwrap();
        assert_eq!(eth.destination(), [0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        assert_eq!(eth.source(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(eth.ether_type(), 0x0806);
        assert_eq!(eth.contents().len(), layout::HEADER_LEN);
        assert_eq!(eth.payload(), &[1, 2, 3]);
        assert_eq!(eth.next_layer_type(), NextLayer::Layer(LayerType::ARP));
    }

    #[test]
    fn parse_built_ipv4_udp_frame() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
            .udp(4000, 4001);
        let payload = [1, 2, 3, 4];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();

        let eth = Ethernet::decode_from_bytes(&packet, &mut NoopFeedback).unwrap();
        assert_eq!(eth.source(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(eth.next_layer_type(), NextLayer::Layer(LayerType::IPV4));
        assert_eq!(eth.payload().len(), packet.len() - layout::HEADER_LEN);
    }

    #[test]
    fn unknown_ether_type_is_terminal() {
        let data = frame(0x88cc, &[0u8; 4]);
        let eth = Ethernet::decode_from_bytes(&data, &mut NoopFeedback).unwrap();
        assert_eq!(eth.next_layer_type(), NextLayer::Terminal);
    }

    #[test]
    fn length_field_reports_anomaly() {
        let data = frame(0x0040, &[0u8; 0x40]);
        let mut feedback = CollectingFeedback::new();
        let eth = Ethernet::decode_from_bytes(&data, &mut feedback).unwrap();
        assert_eq!(eth.next_layer_type(), NextLayer::Terminal);
        assert_eq!(feedback.anomalies().len(), 1);
        assert!(feedback.anomalies()[0].contains("802.3"));
    }

    #[test]
    fn short_frame_is_truncated() {
        let data = frame(layout::ETHER_TYPE_ARP, &[]);
        for len in 0..layout::HEADER_LEN {
            let err = Ethernet::decode_from_bytes(&data[..len], &mut NoopFeedback).unwrap_err();
            assert_eq!(
                err,
                DecodeError::Truncated {
                    needed: layout::HEADER_LEN,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn describe_lists_addresses() {
        let data = frame(layout::ETHER_TYPE_IPV6, &[]);
        let eth = Ethernet::decode_from_bytes(&data, &mut NoopFeedback).unwrap();
        let fields = eth.describe();
        assert_eq!(fields[0], ("destination", "11:22:33:44:55:66".to_string()));
        assert_eq!(fields[2], ("ether_type", "0x86dd".to_string()));
    }
}
