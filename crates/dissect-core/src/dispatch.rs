//! Drives the layer chain over one buffer.

use tracing::debug;

use crate::layers::{DecodeFeedback, Layer, LayerType, NextLayer};
use crate::packet::{DecodeFailure, Packet};
use crate::registry::LayerRegistry;

/// Decode `data` starting with the decoder registered for `first`.
///
/// The loop decodes a layer, follows its [`NextLayer`] and continues on its
/// payload until the bytes run out, a layer is terminal, no decoder is
/// registered for the next tag, or a decoder fails. The last two never
/// discard layers already decoded: a registry miss leaves the remaining
/// bytes as [`Packet::unconsumed`], a failure is recorded as
/// [`Packet::failure`].
///
/// # Examples
/// ```
/// use dissect_core::{LayerRegistry, LayerType, NoopFeedback, decode_packet};
///
/// let registry = LayerRegistry::with_builtin_layers();
/// let data = [
///     0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x02, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
///     0x0a, 0x00, 0x00, 0x01, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x0a, 0x00, 0x00, 0x02,
/// ];
/// let packet = decode_packet(&registry, &data, LayerType::ARP, &mut NoopFeedback);
/// let arp = packet.layer(LayerType::ARP).and_then(|l| l.as_arp()).unwrap();
/// assert_eq!(arp.operation(), 2);
/// assert!(packet.is_complete());
/// ```
pub fn decode_packet<'a>(
    registry: &LayerRegistry,
    data: &'a [u8],
    first: LayerType,
    feedback: &mut dyn DecodeFeedback,
) -> Packet<'a> {
    let mut layers = Vec::new();
    let mut remaining = data;
    let mut next = NextLayer::Layer(first);
    let mut unconsumed = None;
    let mut failure = None;

    while !remaining.is_empty() {
        let tag = match next {
            NextLayer::Layer(tag) => tag,
            NextLayer::Terminal => {
                unconsumed = Some(remaining);
                break;
            }
        };

        let Some(decoder) = registry.lookup(tag) else {
            debug!(layer = %tag, bytes = remaining.len(), "no decoder registered; payload left opaque");
            unconsumed = Some(remaining);
            break;
        };

        match decoder.decode(remaining, feedback) {
            Ok(layer) => {
                let payload = layer.payload();
                if payload.len() >= remaining.len() {
                    feedback.report_anomaly(&format!(
                        "{tag}: decoder consumed no bytes; remaining payload left opaque"
                    ));
                    next = NextLayer::Terminal;
                } else {
                    next = layer.next_layer_type();
                    remaining = payload;
                }
                layers.push(layer);
            }
            Err(error) => {
                debug!(layer = %tag, %error, decoded = layers.len(), "layer decode failed");
                failure = Some(DecodeFailure::new(tag, remaining, error));
                break;
            }
        }
    }

    let consumed = data.len().saturating_sub(remaining.len());
    Packet::new(data, layers, consumed, unconsumed, failure)
}
