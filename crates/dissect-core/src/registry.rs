//! Mapping from [`LayerType`] to decoder.
//!
//! Registration happens on a [`RegistryBuilder`]; [`RegistryBuilder::build`]
//! consumes it and yields a [`LayerRegistry`] with no mutating API. All
//! registration therefore finishes before the first decode, and the built
//! registry can be shared freely across threads.

use std::collections::BTreeMap;

use tracing::debug;

use crate::layers::{
    Arp, DecodeError, DecodeFeedback, DecodedLayer, DecodingLayer, Ethernet, LayerType,
    RegistryError,
};

/// Decoder entry point stored in the registry.
pub type DecodeFn =
    for<'a> fn(&'a [u8], &mut dyn DecodeFeedback) -> Result<DecodedLayer<'a>, DecodeError>;

/// A decoder constructor plus the tags it declares support for.
///
/// # Examples
/// ```
/// use dissect_core::{
///     DecodeError, DecodeFeedback, DecodedLayer, Layer, LayerDecoder, LayerType, NextLayer,
///     RegistryBuilder,
/// };
///
/// const TRAILER: LayerType = LayerType::new(1000);
///
/// #[derive(Debug)]
/// struct Trailer<'a>(&'a [u8]);
///
/// impl<'a> Layer<'a> for Trailer<'a> {
///     fn layer_type(&self) -> LayerType { TRAILER }
///     fn contents(&self) -> &'a [u8] { self.0 }
///     fn payload(&self) -> &'a [u8] { &[] }
///     fn next_layer_type(&self) -> NextLayer { NextLayer::Terminal }
/// }
///
/// fn decode_trailer<'a>(
///     data: &'a [u8],
///     _feedback: &mut dyn DecodeFeedback,
/// ) -> Result<DecodedLayer<'a>, DecodeError> {
///     Ok(DecodedLayer::Custom(Box::new(Trailer(data))))
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder.register(TRAILER, LayerDecoder::new(&[TRAILER], decode_trailer))?;
/// let registry = builder.build();
/// assert!(registry.contains(TRAILER));
/// # Ok::<(), dissect_core::RegistryError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LayerDecoder {
    can_decode: &'static [LayerType],
    decode: DecodeFn,
}

impl LayerDecoder {
    pub const fn new(can_decode: &'static [LayerType], decode: DecodeFn) -> Self {
        Self { can_decode, decode }
    }

    pub fn ethernet() -> Self {
        Self::new(Ethernet::can_decode(), decode_ethernet)
    }

    pub fn arp() -> Self {
        Self::new(Arp::can_decode(), decode_arp)
    }

    pub fn can_decode(&self) -> &'static [LayerType] {
        self.can_decode
    }

    pub fn decode<'a>(
        &self,
        data: &'a [u8],
        feedback: &mut dyn DecodeFeedback,
    ) -> Result<DecodedLayer<'a>, DecodeError> {
        (self.decode)(data, feedback)
    }
}

fn decode_ethernet<'a>(
    data: &'a [u8],
    feedback: &mut dyn DecodeFeedback,
) -> Result<DecodedLayer<'a>, DecodeError> {
    Ethernet::decode_from_bytes(data, feedback).map(DecodedLayer::from)
}

fn decode_arp<'a>(
    data: &'a [u8],
    feedback: &mut dyn DecodeFeedback,
) -> Result<DecodedLayer<'a>, DecodeError> {
    Arp::decode_from_bytes(data, feedback).map(DecodedLayer::from)
}

fn builtin_decoders() -> [(LayerType, LayerDecoder); 2] {
    [
        (LayerType::ETHERNET, LayerDecoder::ethernet()),
        (LayerType::ARP, LayerDecoder::arp()),
    ]
}

/// What [`RegistryBuilder::register`] does with a tag that is already taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`RegistryError::ConstructionConflict`], keeping the first
    /// registration.
    #[default]
    Reject,
    /// The latest registration wins.
    Replace,
}

/// Single writer for a [`LayerRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    decoders: BTreeMap<LayerType, LayerDecoder>,
    policy: DuplicatePolicy,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register `decoder` for `tag`.
    ///
    /// # Errors
    /// - [`RegistryError::UnsupportedTag`] when `tag` is not in the decoder's
    ///   `can_decode` set.
    /// - [`RegistryError::ConstructionConflict`] when `tag` is already
    ///   registered and the policy is [`DuplicatePolicy::Reject`]; the first
    ///   registration is left intact.
    pub fn register(
        &mut self,
        tag: LayerType,
        decoder: LayerDecoder,
    ) -> Result<&mut Self, RegistryError> {
        if !decoder.can_decode().contains(&tag) {
            return Err(RegistryError::UnsupportedTag { tag });
        }
        if self.decoders.contains_key(&tag) && self.policy == DuplicatePolicy::Reject {
            return Err(RegistryError::ConstructionConflict { tag });
        }
        debug!(layer = %tag, "registered layer decoder");
        self.decoders.insert(tag, decoder);
        Ok(self)
    }

    /// Register the Ethernet and ARP decoders.
    pub fn register_builtin_layers(&mut self) -> Result<&mut Self, RegistryError> {
        for (tag, decoder) in builtin_decoders() {
            self.register(tag, decoder)?;
        }
        Ok(self)
    }

    pub fn build(self) -> LayerRegistry {
        LayerRegistry {
            decoders: self.decoders,
        }
    }
}

/// Read-only map from tag to decoder.
#[derive(Debug, Default, Clone)]
pub struct LayerRegistry {
    decoders: BTreeMap<LayerType, LayerDecoder>,
}

impl LayerRegistry {
    /// Registry holding the built-in Ethernet and ARP decoders.
    pub fn with_builtin_layers() -> Self {
        Self {
            decoders: builtin_decoders().into_iter().collect(),
        }
    }

    pub fn lookup(&self, tag: LayerType) -> Option<&LayerDecoder> {
        self.decoders.get(&tag)
    }

    pub fn contains(&self, tag: LayerType) -> bool {
        self.decoders.contains_key(&tag)
    }

    /// Registered tags in ascending order.
    pub fn layer_types(&self) -> impl Iterator<Item = LayerType> + '_ {
        self.decoders.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}
