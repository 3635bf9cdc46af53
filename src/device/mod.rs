//! Camera HTTP/JSON API
//!
//! - [`endpoint`]: where and how to reach the camera
//! - [`transport`]: one HTTP exchange
//! - [`request`]: query string construction
//! - [`command`]: enumerated commands and request bodies
//! - [`response`]: two-layer response normalization
//! - [`client`]: all of the above, wired to connection health

pub mod client;
pub mod command;
pub mod endpoint;
pub mod request;
pub mod response;
pub mod transport;

pub use client::DeviceClient;
pub use command::{CommandEnvelope, CommandName};
pub use endpoint::{Credentials, DEFAULT_TIMEOUT, DeviceEndpoint, Protocol, TrustPolicy};
pub use request::{QueryOptions, build_target};
pub use response::{DeviceResponse, ErrorDetail, Normalized, ResultRecord, normalize};
pub use transport::{
    HttpTransport, Method, RawResponse, Transport, TransportError, TransportErrorKind,
};
