//! Payload type registry and JSON codec for event-sourced messages.
//!
//! Payload kinds are registered by name with an initiator. Afterwards a
//! payload value converts to `(name, bytes)` and `(name, bytes)` constructs
//! the payload back with the same concrete type and value/reference handle.
//!
//! No I/O happens here. Deciding when to serialize, and any envelope around
//! the bytes, belongs to the event store or bus calling in.

pub mod config;
pub mod data;
pub mod error;
pub mod initiator;
pub mod payload;
pub mod transformer;

pub use config::CodecConfig;
pub use data::PayloadData;
pub use error::{PayloadError, PayloadResult};
pub use initiator::PayloadInitiator;
pub use payload::{AnyPayload, AsPayload, Handle, Payload, PayloadShape};
pub use transformer::PayloadTransformer;
