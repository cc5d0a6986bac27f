//! Server-sent event streaming: frame decoding and the cancellable transport.

pub mod error;
pub mod frame;
pub mod transport;

pub use error::{StreamError, StreamErrorKind, StreamResult};
pub use frame::FrameStream;
pub use transport::{StreamRequest, StreamSignal, StreamTransport, TransportState};
