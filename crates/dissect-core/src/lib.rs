//! Layered decoding of captured binary protocol data.
//!
//! A raw buffer is handed to the decoder registered for its first layer
//! type. Each decoder splits its input into header `contents` and `payload`
//! and names the layer type of the payload; the dispatcher loops until the
//! bytes run out, a layer is terminal, no decoder is registered, or a decoder
//! fails. Layers already decoded are always kept.
//!
//! Concrete layers follow the layout/parser structure and read through a
//! checked [`ByteReader`], so decoders are pure and never index out of
//! bounds. Capture files are read in `source`; `analysis` turns a capture or
//! a single buffer into a deterministic JSON report.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use dissect_core::{LayerRegistry, analyze_pcap_file};
//!
//! let registry = LayerRegistry::with_builtin_layers();
//! let report = analyze_pcap_file(Path::new("capture.pcapng"), &registry)?;
//! println!("failed packets: {}", report.totals.failed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

mod analysis;
mod dispatch;
pub mod layers;
mod packet;
mod registry;
mod source;

pub use analysis::{AnalysisError, analyze_bytes, analyze_pcap_file, analyze_source, first_layer_for};
pub use dispatch::decode_packet;
pub use layers::arp::{Arp, ArpOperation};
pub use layers::{
    ByteReader, CollectingFeedback, DecodeError, DecodeFeedback, DecodedLayer, DecodingLayer,
    Ethernet, Layer, LayerType, NextLayer, NoopFeedback, RegistryError, TracingFeedback,
};
pub use packet::{DecodeFailure, Packet};
pub use registry::{DecodeFn, DuplicatePolicy, LayerDecoder, LayerRegistry, RegistryBuilder};
pub use source::{CapturedFrame, FrameSource, PcapFileSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decode report for a capture file or a single buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the last captured frame, or the epoch.
    pub generated_at: String,
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Container error that cut the capture short; packets read before it are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub totals: DecodeTotals,
    /// One entry per frame, in capture order.
    pub packets: Vec<PacketSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path (or label) as provided to the analyzer.
    pub path: String,
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub packets_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Outcome counts over all packets.
///
/// `complete + partial + failed == packets`. `layers` counts decoded layers
/// by type name, sorted by name.
///
/// # Examples
/// ```
/// use dissect_core::DecodeTotals;
///
/// let totals = DecodeTotals::default();
/// assert_eq!(totals.packets, 0);
/// assert!(totals.layers.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeTotals {
    pub packets: u64,
    /// No decoder failed.
    pub complete: u64,
    /// Some layers decoded before a decoder failed.
    pub partial: u64,
    /// The first decoder failed.
    pub failed: u64,
    pub anomalies: u64,
    pub layers: BTreeMap<String, u64>,
}

/// Decode result for one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketSummary {
    /// Zero-based position in the capture.
    pub index: u64,
    /// RFC3339 capture timestamp, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub len: usize,
    pub layers: Vec<LayerSummary>,
    /// Trailing bytes no decoder interpreted.
    pub unconsumed_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSummary {
    #[serde(rename = "type")]
    pub layer_type: String,
    pub header_len: usize,
    pub payload_len: usize,
    /// Decoded header fields in wire order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<LayerField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerField {
    pub name: String,
    pub value: String,
}

/// The decoder that stopped a packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureSummary {
    pub layer: String,
    /// Offset of the failing layer within the frame.
    pub offset: usize,
    pub message: String,
}

/// Build a stub report with base fields filled and no packets.
///
/// # Examples
/// ```
/// use dissect_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, dissect_core::REPORT_VERSION);
/// assert!(report.packets.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "dissect".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        source_error: None,
        totals: DecodeTotals::default(),
        packets: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report("capture.pcapng", 1);
        report.capture_summary = Some(CaptureSummary {
            packets_total: 1,
            time_start: None,
            time_end: None,
        });
        report.packets.push(PacketSummary {
            index: 0,
            ts: None,
            len: 4,
            layers: vec![LayerSummary {
                layer_type: "layer-1000".to_string(),
                header_len: 4,
                payload_len: 0,
                fields: Vec::new(),
            }],
            unconsumed_len: 0,
            error: None,
            anomalies: Vec::new(),
        });

        let value = serde_json::to_value(&report).expect("report json");
        let capture = value.get("capture_summary").expect("capture_summary");
        assert!(capture.get("time_start").is_none());
        assert!(capture.get("time_end").is_none());
        assert!(value.get("source_error").is_none());

        let packet = &value["packets"][0];
        assert!(packet.get("ts").is_none());
        assert!(packet.get("error").is_none());
        assert!(packet.get("anomalies").is_none());
        assert_eq!(packet["layers"][0]["type"], "layer-1000");
        assert!(packet["layers"][0].get("fields").is_none());
    }

    #[test]
    fn totals_serialize_layer_counts_in_name_order() {
        let mut totals = DecodeTotals::default();
        totals.layers.insert("ethernet".to_string(), 2);
        totals.layers.insert("arp".to_string(), 1);
        let json = serde_json::to_string(&totals).expect("totals json");
        assert!(json.find("\"arp\"") < json.find("\"ethernet\""));
    }
}
