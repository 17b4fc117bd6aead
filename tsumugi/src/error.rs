//! Client error types.

use crate::transport::TransportError;
use thiserror::Error;
use tsumugi_core::RegistryError;

/// Errors surfaced by [`GatewayClient`](crate::GatewayClient).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A plugin failed to load.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The transport rejected a dial or send.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An action could not be serialized.
    #[error("failed to encode action: {0}")]
    Encode(#[from] serde_json::Error),

    /// The gateway address could not be parsed.
    #[error("invalid gateway url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The gateway address does not use `ws` or `wss`.
    #[error("unsupported gateway url scheme `{0}`")]
    UnsupportedScheme(String),

    /// The access token cannot be sent as a header value.
    #[error("access token contains characters not allowed in a header")]
    InvalidToken,
}
