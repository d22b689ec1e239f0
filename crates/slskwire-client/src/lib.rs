//! Typed search and download client for a Soulseek gateway.
//!
//! This is the "just works" layer. It speaks the gateway's tagged-JSON
//! envelope over a [`ConnectionMux`](slskwire_mux::ConnectionMux), sending
//! typed search and download requests and fanning decoded server messages
//! out to per-kind subscriber lists.

pub mod error;
pub mod message;
pub mod records;
pub mod router;

pub use error::{ClientError, DecodeError, Result};
pub use message::{
    ClientMessageType, Envelope, SearchRequest, ServerMessageType, TrackDownloadRequest,
    RESERVED_TYPE_DIRECTORY,
};
pub use records::{download_status, SearchResponse, ServerError, TrackDownloadInfo, TrackInfo};
pub use router::{decode_server_message, ClientEvent, ClientEventKind, SlskClient};
