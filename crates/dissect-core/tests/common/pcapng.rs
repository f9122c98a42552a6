//! Minimal capture writers for fixtures.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const LINKTYPE_ETHERNET: u16 = 1;
pub const LINKTYPE_RAW: u16 = 101;

const ETHER_TYPE_ARP: u16 = 0x0806;
const ETHER_TYPE_IPV4: u16 = 0x0800;

/// One frame to write: interface index, timestamp in microseconds, bytes.
pub struct Frame {
    pub if_id: u32,
    pub ts_us: u64,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(ts_us: u64, data: Vec<u8>) -> Self {
        Self {
            if_id: 0,
            ts_us,
            data,
        }
    }

    pub fn on_interface(mut self, if_id: u32) -> Self {
        self.if_id = if_id;
        self
    }
}

pub fn arp_payload(operation: u16, sender_ip: [u8; 4], target_ip: [u8; 4]) -> Vec<u8> {
    let mut arp = Vec::with_capacity(28);
    arp.extend_from_slice(&1u16.to_be_bytes());
    arp.extend_from_slice(&ETHER_TYPE_IPV4.to_be_bytes());
    arp.push(6);
    arp.push(4);
    arp.extend_from_slice(&operation.to_be_bytes());
    arp.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    arp.extend_from_slice(&sender_ip);
    arp.extend_from_slice(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    arp.extend_from_slice(&target_ip);
    arp
}

pub fn ethernet_frame(ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14 + payload.len());
    frame.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    frame.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    frame.extend_from_slice(&ether_type.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub fn arp_request_frame() -> Vec<u8> {
    ethernet_frame(ETHER_TYPE_ARP, &arp_payload(1, [192, 168, 0, 1], [192, 168, 0, 2]))
}

pub fn arp_reply_frame() -> Vec<u8> {
    ethernet_frame(ETHER_TYPE_ARP, &arp_payload(2, [192, 168, 0, 2], [192, 168, 0, 1]))
}

/// Ethernet header followed by the first 20 bytes of an ARP header.
pub fn truncated_arp_frame() -> Vec<u8> {
    let mut frame = arp_request_frame();
    frame.truncate(14 + 20);
    frame
}

pub fn ipv4_frame() -> Vec<u8> {
    ethernet_frame(ETHER_TYPE_IPV4, &[0x45, 0x00, 0x00, 0x14, 0, 0, 0, 0, 64, 17])
}

pub fn write_pcapng(path: &Path, linktypes: &[u16], frames: &[Frame]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(path, pcapng_bytes(linktypes, frames))
        .map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

pub fn pcapng_bytes(linktypes: &[u16], frames: &[Frame]) -> Vec<u8> {
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(0x0A0D0D0A, &section_header_body()));
    for linktype in linktypes {
        output.extend_from_slice(&pcapng_block(1, &interface_desc_body(*linktype)));
    }
    for frame in frames {
        output.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(frame)));
    }
    output
}

/// Legacy little-endian `.pcap` with a single link type.
pub fn legacy_pcap_bytes(linktype: u32, frames: &[Frame]) -> Vec<u8> {
    let mut output = Vec::new();
    output.extend_from_slice(&0xa1b2c3d4u32.to_le_bytes());
    output.extend_from_slice(&2u16.to_le_bytes());
    output.extend_from_slice(&4u16.to_le_bytes());
    output.extend_from_slice(&0i32.to_le_bytes());
    output.extend_from_slice(&0u32.to_le_bytes());
    output.extend_from_slice(&65535u32.to_le_bytes());
    output.extend_from_slice(&linktype.to_le_bytes());
    for frame in frames {
        let len = frame.data.len() as u32;
        output.extend_from_slice(&((frame.ts_us / 1_000_000) as u32).to_le_bytes());
        output.extend_from_slice(&((frame.ts_us % 1_000_000) as u32).to_le_bytes());
        output.extend_from_slice(&len.to_le_bytes());
        output.extend_from_slice(&len.to_le_bytes());
        output.extend_from_slice(&frame.data);
    }
    output
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body(linktype: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&linktype.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    body
}

fn enhanced_packet_body(frame: &Frame) -> Vec<u8> {
    let ts_high = ((frame.ts_us >> 32) & 0xFFFF_FFFF) as u32;
    let ts_low = (frame.ts_us & 0xFFFF_FFFF) as u32;
    let cap_len = frame.data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&frame.if_id.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&frame.data);
    let pad_len = (4 - (frame.data.len() % 4)) % 4;
    body.extend(std::iter::repeat_n(0u8, pad_len));
    body
}
