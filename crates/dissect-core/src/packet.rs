//! Result of one decode pass over one buffer.

use crate::layers::{DecodeError, DecodedLayer, Layer, LayerType};

/// The layer that stopped a decode pass, with the bytes it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure<'a> {
    layer_type: LayerType,
    data: &'a [u8],
    error: DecodeError,
}

impl<'a> DecodeFailure<'a> {
    pub(crate) fn new(layer_type: LayerType, data: &'a [u8], error: DecodeError) -> Self {
        Self {
            layer_type,
            data,
            error,
        }
    }

    pub fn layer_type(&self) -> LayerType {
        self.layer_type
    }

    /// Bytes the failing decoder was asked to interpret.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn error(&self) -> &DecodeError {
        &self.error
    }
}

/// Ordered layers decoded from one buffer.
///
/// A packet is read-only. It holds at most one of an opaque trailing
/// remainder (no decoder for the next tag, or the last layer was terminal)
/// or a [`DecodeFailure`] (a decoder rejected its input); layers decoded
/// before a failure are kept.
#[derive(Debug)]
pub struct Packet<'a> {
    data: &'a [u8],
    layers: Vec<DecodedLayer<'a>>,
    consumed: usize,
    unconsumed: Option<&'a [u8]>,
    failure: Option<DecodeFailure<'a>>,
}

impl<'a> Packet<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        layers: Vec<DecodedLayer<'a>>,
        consumed: usize,
        unconsumed: Option<&'a [u8]>,
        failure: Option<DecodeFailure<'a>>,
    ) -> Self {
        Self {
            data,
            layers,
            consumed,
            unconsumed,
            failure,
        }
    }

    /// A packet no decoder looked at.
    pub(crate) fn opaque(data: &'a [u8]) -> Self {
        let unconsumed = (!data.is_empty()).then_some(data);
        Self::new(data, Vec::new(), 0, unconsumed, None)
    }

    /// The buffer this packet was decoded from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Decoded layers, outermost first.
    pub fn layers(&self) -> &[DecodedLayer<'a>] {
        &self.layers
    }

    /// First layer with the given tag.
    ///
    /// When a tag repeats (protocol-in-protocol tunnelling) only the
    /// outermost occurrence is returned; use [`Packet::layers_of`] for all.
    pub fn layer(&self, tag: LayerType) -> Option<&DecodedLayer<'a>> {
        self.layers.iter().find(|layer| layer.layer_type() == tag)
    }

    /// Every layer with the given tag, outermost first.
    pub fn layers_of(&self, tag: LayerType) -> impl Iterator<Item = &DecodedLayer<'a>> + '_ {
        self.layers
            .iter()
            .filter(move |layer| layer.layer_type() == tag)
    }

    /// Header bytes of all decoded layers, in order.
    ///
    /// Each layer's payload is the input of the next, so this is a prefix of
    /// [`Packet::data`].
    pub fn raw_contents(&self) -> &'a [u8] {
        self.data.get(..self.consumed).unwrap_or(self.data)
    }

    /// Trailing bytes no decoder interpreted.
    pub fn unconsumed(&self) -> Option<&'a [u8]> {
        self.unconsumed
    }

    pub fn failure(&self) -> Option<&DecodeFailure<'a>> {
        self.failure.as_ref()
    }

    pub fn error(&self) -> Option<&DecodeError> {
        self.failure.as_ref().map(DecodeFailure::error)
    }

    /// True when no decoder failed.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
