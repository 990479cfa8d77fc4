//! Raw HTTP/1.1 plumbing
//!
//! This module contains the protocol layer the crawler speaks directly:
//! - Request serialization with session cookies
//! - Response parsing and message framing
//! - The reconnectable stream transport (TLS or plain TCP)

mod request;
mod response;
mod transport;

pub use request::RequestBuilder;
pub use response::{is_complete, parse, HttpResponse, ParseError, Status};
pub use transport::{
    BoxedStream, ByteStream, Connector, RustlsConnector, TcpConnector, Transport, TransportError,
    RECV_BUFFER_SIZE,
};
