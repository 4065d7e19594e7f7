//! Protocol module containing relay message types and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_inbound, encode_outbound, ProtocolError};
pub use messages::*;
