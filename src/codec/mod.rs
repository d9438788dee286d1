//! # Batch codec
//!
//! Turns request payloads into item identifiers and typed results back into
//! response bodies, in plain text or JSON.

pub mod encoding;
pub mod reply;

pub use encoding::{CodecError, Encoding, ItemList, APPLICATION_JSON, TEXT_PLAIN};
pub use reply::Reply;
