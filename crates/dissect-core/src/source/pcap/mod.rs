//! PCAP/PCAPNG file source.
//!
//! Detects the container format from the magic bytes and yields captured
//! frames with their interface link type.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
