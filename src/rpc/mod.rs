// JSON-RPC transport layer
// - framing.rs: Content-Length framing over byte streams
// - message.rs: Request/Notification/Response envelopes
// - error.rs: FramingError, ParseError

pub mod error;
pub mod framing;
pub mod message;

pub use error::{FramingError, ParseError};
pub use framing::{MessageReader, MessageWriter};
pub use message::{ErrorCode, Id, Message, Notification, Request, Response, ResponseError};
