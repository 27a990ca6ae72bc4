//! Vela binary push gateway client
//!
//! Client library for the legacy ("enhanced", type-2) binary push protocol:
//! a persistent mutually-authenticated TLS connection used to write
//! notification frames and drain the gateway's asynchronous 6-byte
//! error-response frames.
//!
//! It handles:
//! - Connection lifecycle: connect, push, reconnect, disconnect
//! - The asynchronous error channel and identifier correlation
//! - Environment selection (production vs sandbox), including
//!   auto-resolution from the credential's embedded entitlement
//! - Classification of socket, TLS handshake, stream, and credential
//!   failures into the unified `push-error-types` taxonomy
//! - The feedback service's token/date stream

pub mod client;
pub mod config;
pub mod credentials;
pub mod feedback;
pub mod frame;
pub mod notification;
pub mod transport;

pub use client::{FailedNotification, GatewayClient};
pub use config::Environment;
pub use credentials::{environment_for, CredentialResolver, Identity};
pub use feedback::FeedbackClient;
pub use frame::{ErrorResponse, FeedbackRecord};
pub use notification::{PayloadEncoder, PushNotification};
pub use push_error_types::{ErrorKind, PushError, PushResult};
pub use transport::{TlsTransportConnector, TransportConnector, TransportSession};
