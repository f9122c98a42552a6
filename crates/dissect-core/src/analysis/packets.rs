use crate::layers::Layer;
use crate::packet::Packet;
use crate::{DecodeTotals, FailureSummary, LayerField, LayerSummary, PacketSummary};

pub(super) fn summarize_packet(
    index: u64,
    ts: Option<String>,
    packet: &Packet<'_>,
    anomalies: Vec<String>,
) -> PacketSummary {
    let layers = packet
        .layers()
        .iter()
        .map(|layer| LayerSummary {
            layer_type: layer.layer_type().to_string(),
            header_len: layer.contents().len(),
            payload_len: layer.payload().len(),
            fields: layer
                .describe()
                .into_iter()
                .map(|(name, value)| LayerField {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        })
        .collect();

    let error = packet.failure().map(|failure| FailureSummary {
        layer: failure.layer_type().to_string(),
        offset: packet.data().len().saturating_sub(failure.data().len()),
        message: failure.error().to_string(),
    });

    PacketSummary {
        index,
        ts,
        len: packet.data().len(),
        layers,
        unconsumed_len: packet.unconsumed().map_or(0, <[u8]>::len),
        error,
        anomalies,
    }
}

/// Fold one packet into the totals.
///
/// A packet is `failed` when a decoder rejected it before any layer was
/// decoded, `partial` when layers were kept ahead of the failure, and
/// `complete` otherwise (an opaque remainder is not a failure).
pub(super) fn add_packet_totals(totals: &mut DecodeTotals, summary: &PacketSummary) {
    totals.packets += 1;
    match (&summary.error, summary.layers.is_empty()) {
        (None, _) => totals.complete += 1,
        (Some(_), true) => totals.failed += 1,
        (Some(_), false) => totals.partial += 1,
    }
    totals.anomalies += summary.anomalies.len() as u64;
    for layer in &summary.layers {
        *totals.layers.entry(layer.layer_type.clone()).or_insert(0) += 1;
    }
}
