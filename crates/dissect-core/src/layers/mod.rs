//! Layer contract and concrete layer decoders.
//!
//! Each concrete layer follows the same structure:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `parser`: domain-level decoding through [`ByteReader`] (no direct byte
//!   indexing)
//! - `error`: layer-specific conventions, when the layer needs any
//!
//! Decoders are pure and contain no I/O. A decoded layer borrows its
//! `contents` and `payload` from the caller's buffer; nothing is copied.

use std::fmt;

pub mod arp;
pub mod common;
pub mod error;
pub mod ethernet;
pub mod feedback;

pub use arp::Arp;
pub use common::ByteReader;
pub use error::{DecodeError, RegistryError};
pub use ethernet::Ethernet;
pub use feedback::{CollectingFeedback, DecodeFeedback, NoopFeedback, TracingFeedback};

/// Identifier selecting which decoder applies to a byte range.
///
/// Tags are totally ordered so they can key ordered maps and sort reports.
/// Ids below [`LayerType::FIRST_CUSTOM_ID`] are reserved for built-in layers.
///
/// # Examples
/// ```
/// use dissect_core::LayerType;
///
/// const TUNNEL: LayerType = LayerType::new(1000);
/// assert_eq!(LayerType::ARP.to_string(), "arp");
/// assert_eq!(TUNNEL.to_string(), "layer-1000");
/// assert!(LayerType::ETHERNET < TUNNEL);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerType(u16);

impl LayerType {
    pub const ETHERNET: LayerType = LayerType(1);
    pub const ARP: LayerType = LayerType(2);
    pub const IPV4: LayerType = LayerType(3);
    pub const IPV6: LayerType = LayerType(4);

    pub const FIRST_CUSTOM_ID: u16 = 1000;

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    /// Protocol name for built-in tags.
    pub fn name(self) -> Option<&'static str> {
        match self {
            LayerType::ETHERNET => Some("ethernet"),
            LayerType::ARP => Some("arp"),
            LayerType::IPV4 => Some("ipv4"),
            LayerType::IPV6 => Some("ipv6"),
            _ => None,
        }
    }

    /// Parse a built-in tag from its protocol name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        [
            LayerType::ETHERNET,
            LayerType::ARP,
            LayerType::IPV4,
            LayerType::IPV6,
        ]
        .into_iter()
        .find(|tag| tag.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "layer-{}", self.0),
        }
    }
}

/// Which tag should interpret a layer's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextLayer {
    Layer(LayerType),
    /// No further structured layer; the remainder is opaque.
    Terminal,
}

/// A decoded, immutable protocol header.
///
/// `contents` and `payload` are views into the buffer the layer was decoded
/// from. For every layer, `contents` followed by `payload` is exactly the
/// input handed to the decoder.
pub trait Layer<'a>: fmt::Debug {
    fn layer_type(&self) -> LayerType;

    /// Bytes belonging to this header.
    fn contents(&self) -> &'a [u8];

    /// Bytes following this header, handed to the next layer.
    fn payload(&self) -> &'a [u8];

    fn next_layer_type(&self) -> NextLayer;

    /// Ordered `(field, value)` pairs for reports.
    fn describe(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// A layer that can be decoded from raw bytes.
pub trait DecodingLayer<'a>: Layer<'a> + Sized {
    /// Parse a header from the start of `data`.
    ///
    /// On failure nothing of the partially read header is returned.
    fn decode_from_bytes(
        data: &'a [u8],
        feedback: &mut dyn DecodeFeedback,
    ) -> Result<Self, DecodeError>;

    /// Tags this implementation supports; checked when it is registered.
    fn can_decode() -> &'static [LayerType];
}

/// A layer produced by a registered decoder.
///
/// Built-in layers are typed variants; decoders registered by library users
/// produce [`DecodedLayer::Custom`].
#[derive(Debug)]
pub enum DecodedLayer<'a> {
    Ethernet(Ethernet<'a>),
    Arp(Arp<'a>),
    Custom(Box<dyn Layer<'a> + Send + Sync + 'a>),
}

impl<'a> DecodedLayer<'a> {
    pub fn as_ethernet(&self) -> Option<&Ethernet<'a>> {
        match self {
            DecodedLayer::Ethernet(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_arp(&self) -> Option<&Arp<'a>> {
        match self {
            DecodedLayer::Arp(layer) => Some(layer),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Layer<'a> {
        match self {
            DecodedLayer::Ethernet(layer) => layer,
            DecodedLayer::Arp(layer) => layer,
            DecodedLayer::Custom(layer) => layer.as_ref(),
        }
    }
}

impl<'a> Layer<'a> for DecodedLayer<'a> {
    fn layer_type(&self) -> LayerType {
        self.inner().layer_type()
    }

    fn contents(&self) -> &'a [u8] {
        self.inner().contents()
    }

    fn payload(&self) -> &'a [u8] {
        self.inner().payload()
    }

    fn next_layer_type(&self) -> NextLayer {
        self.inner().next_layer_type()
    }

    fn describe(&self) -> Vec<(&'static str, String)> {
        self.inner().describe()
    }
}

impl<'a> From<Ethernet<'a>> for DecodedLayer<'a> {
    fn from(layer: Ethernet<'a>) -> Self {
        DecodedLayer::Ethernet(layer)
    }
}

impl<'a> From<Arp<'a>> for DecodedLayer<'a> {
    fn from(layer: Arp<'a>) -> Self {
        DecodedLayer::Arp(layer)
    }
}
