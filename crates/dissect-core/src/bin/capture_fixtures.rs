//! Writes the ARP capture fixtures used for manual runs of `dissect`.
//!
//! Usage: `capture_fixtures [OUTPUT_DIR]` (defaults to `fixtures`).

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

#[path = "../../tests/common/pcapng.rs"]
mod pcapng;

use pcapng::{
    Frame, LINKTYPE_ETHERNET, LINKTYPE_RAW, arp_reply_frame, arp_request_frame, ipv4_frame,
    truncated_arp_frame, write_pcapng,
};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fixtures"));

    write_pcapng(
        &root.join("arp_exchange").join("input.pcapng"),
        &[LINKTYPE_ETHERNET],
        &[
            Frame::new(1_000_000, arp_request_frame()),
            Frame::new(1_000_250, arp_reply_frame()),
        ],
    )?;
    write_pcapng(
        &root.join("arp_truncated").join("input.pcapng"),
        &[LINKTYPE_ETHERNET],
        &[
            Frame::new(1_000_000, arp_request_frame()),
            Frame::new(2_000_000, truncated_arp_frame()),
        ],
    )?;
    write_pcapng(
        &root.join("mixed_linktypes").join("input.pcapng"),
        &[LINKTYPE_ETHERNET, LINKTYPE_RAW],
        &[
            Frame::new(1_000_000, ipv4_frame()),
            Frame::new(2_000_000, vec![0x45, 0x00, 0x00, 0x14]).on_interface(1),
        ],
    )?;
    Ok(())
}
