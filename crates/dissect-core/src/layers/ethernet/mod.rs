//! Ethernet II framing.
//!
//! The 14-byte header is sliced with `etherparse`; the EtherType selects the
//! next layer. EtherTypes without a built-in tag end the chain and leave the
//! rest of the frame as opaque payload.

pub mod layout;
pub mod parser;

pub use parser::Ethernet;
