/// Errors that can occur in multiplexer operations.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    /// A send was attempted while the transport is absent or not open.
    #[error("transport is not connected")]
    NotConnected,

    /// An event name outside the fixed registry was used for registration.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// An outbound message could not be serialized to wire text.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] slskwire_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, MuxError>;
