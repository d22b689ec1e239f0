/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The operation requires an open connection.
    #[error("transport is not connected")]
    NotConnected,

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An inbound message was not valid UTF-8 text.
    #[error("inbound message is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    /// An inbound message exceeds the configured maximum size.
    #[error("inbound message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
