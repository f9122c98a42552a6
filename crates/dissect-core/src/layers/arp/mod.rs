//! Address-resolution (ARP) header decoding.
//!
//! The fixed 8-byte prefix carries hardware/protocol address types, the two
//! address lengths and the operation code. The lengths size the four address
//! fields that follow, so the full header length is validated against the
//! buffer before any address byte is read.
//!
//! Address lengths that disagree with a well-known address family (Ethernet
//! with a hardware length other than 6, IPv4 with a protocol length other
//! than 4) are reported as anomalies, not failures. ARP never selects a
//! further structured layer.

pub mod layout;
pub mod parser;

pub use parser::{Arp, ArpOperation};
