use std::path::Path;

use pcap_parser::Linktype;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

use crate::dispatch::decode_packet;
use crate::layers::{CollectingFeedback, LayerType};
use crate::packet::Packet;
use crate::registry::LayerRegistry;
use crate::source::{CapturedFrame, FrameSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, DecodeTotals, PacketSummary, Report, make_stub_report};

mod packets;

use packets::{add_packet_totals, summarize_packet};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode every frame of a capture file into a report.
///
/// Only failing to open the file is an error. A container error part way
/// through ends the capture and lands in [`Report::source_error`].
pub fn analyze_pcap_file(path: &Path, registry: &LayerRegistry) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, registry)
}

pub fn analyze_source<S: FrameSource>(
    path: &Path,
    mut source: S,
    registry: &LayerRegistry,
) -> Result<Report, AnalysisError> {
    let mut first_ts = None;
    let mut last_ts = None;
    let mut totals = DecodeTotals::default();
    let mut packets = Vec::new();
    let mut source_error = None;

    loop {
        let CapturedFrame { ts, linktype, data } = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) => {
                warn!(
                    input = %path.display(),
                    packets = totals.packets,
                    error = %err,
                    "capture cut short; keeping packets read so far"
                );
                source_error = Some(err.to_string());
                break;
            }
        };
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);
        let summary = decode_frame(totals.packets, ts, linktype, &data, registry);
        add_packet_totals(&mut totals, &summary);
        packets.push(summary);
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        packets_total: totals.packets,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());

    info!(
        input = %path.display(),
        packets = totals.packets,
        partial = totals.partial,
        failed = totals.failed,
        "capture analysed"
    );
    report.source_error = source_error;
    report.totals = totals;
    report.packets = packets;
    Ok(report)
}

/// Decode a single buffer, starting at `first`, into a one-packet report.
///
/// # Examples
/// ```
/// use dissect_core::{LayerRegistry, LayerType, analyze_bytes};
///
/// let data = [
///     0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
///     0xc0, 0xa8, 0x00, 0x01, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0xc0, 0xa8, 0x00, 0x02,
/// ];
/// let registry = LayerRegistry::with_builtin_layers();
/// let report = analyze_bytes("<hex>", &data, LayerType::ARP, &registry);
/// assert_eq!(report.totals.complete, 1);
/// assert_eq!(report.packets[0].layers[0].layer_type, "arp");
/// ```
pub fn analyze_bytes(label: &str, data: &[u8], first: LayerType, registry: &LayerRegistry) -> Report {
    let mut feedback = CollectingFeedback::new();
    let packet = decode_packet(registry, data, first, &mut feedback);
    let summary = summarize_packet(0, None, &packet, feedback.into_anomalies());
    log_anomalies(&summary);

    let mut totals = DecodeTotals::default();
    add_packet_totals(&mut totals, &summary);

    let mut report = make_stub_report(label, data.len() as u64);
    report.capture_summary = Some(CaptureSummary {
        packets_total: totals.packets,
        time_start: None,
        time_end: None,
    });
    report.totals = totals;
    report.packets = vec![summary];
    report
}

/// First decoder for a capture link type, if one is registered by default.
pub fn first_layer_for(linktype: Linktype) -> Option<LayerType> {
    match linktype {
        Linktype::ETHERNET => Some(LayerType::ETHERNET),
        _ => None,
    }
}

fn decode_frame(
    index: u64,
    ts: Option<f64>,
    linktype: Linktype,
    data: &[u8],
    registry: &LayerRegistry,
) -> PacketSummary {
    let mut feedback = CollectingFeedback::new();
    let packet = match first_layer_for(linktype) {
        Some(first) => decode_packet(registry, data, first, &mut feedback),
        None => {
            debug!(index, linktype = linktype.0, "no first layer for link type; frame left opaque");
            Packet::opaque(data)
        }
    };
    let summary = summarize_packet(index, ts_to_rfc3339(ts), &packet, feedback.into_anomalies());
    log_anomalies(&summary);
    summary
}

fn log_anomalies(summary: &PacketSummary) {
    for anomaly in &summary.anomalies {
        debug!(index = summary.index, anomaly = anomaly.as_str(), "decode anomaly");
    }
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
