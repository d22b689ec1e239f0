/// Errors raised while decoding an inbound message into a typed record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The message text is not a well-formed `{msg_type, data}` envelope.
    #[error("malformed message envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The envelope's `data` does not decode into the expected record.
    /// The source error names the missing field or the mismatched type.
    #[error("malformed {record} payload: {source}")]
    Payload {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An event name outside the fixed registry was used for registration.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Connection-layer error.
    #[error("connection error: {0}")]
    Mux(#[from] slskwire_mux::MuxError),

    /// Decode error surfaced through a direct decode call.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
