//! Wire envelope and message-type discriminators.
//!
//! Every message in both directions is one JSON object
//! `{"msg_type": <integer>, "data": <object>}`. Client-to-server and
//! server-to-client discriminators are independent numbering spaces that
//! overlap in value; the two enums here keep them from ever mixing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire value `0` in the server namespace. The server uses it for a
/// directory of its own message types; this client has no decode branch
/// for it and treats it like any unrecognized type.
pub const RESERVED_TYPE_DIRECTORY: u16 = 0;

/// Discriminators for messages sent by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageType {
    /// Ask the gateway to start a track search.
    SearchRequest = 1,
    /// Ask the gateway to start a track download.
    TrackDownloadRequest = 2,
}

impl ClientMessageType {
    /// The `msg_type` value carried on the wire.
    pub const fn wire_value(self) -> u16 {
        self as u16
    }
}

/// Discriminators for messages sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessageType {
    /// A single track offered by a peer.
    TrackInfo = 1,
    /// One peer's reply to a search ticket.
    SearchResponse = 2,
    /// Status of an in-flight download.
    TrackDownloadResponse = 3,
    /// A server-reported error.
    Error = 4,
}

impl ServerMessageType {
    /// The `msg_type` value carried on the wire.
    pub const fn wire_value(self) -> u16 {
        self as u16
    }

    /// Look up a discriminator by wire value. Returns `None` for anything
    /// outside the recognized set, including [`RESERVED_TYPE_DIRECTORY`].
    pub fn from_wire(value: u16) -> Option<Self> {
        match value {
            1 => Some(ServerMessageType::TrackInfo),
            2 => Some(ServerMessageType::SearchResponse),
            3 => Some(ServerMessageType::TrackDownloadResponse),
            4 => Some(ServerMessageType::Error),
            _ => None,
        }
    }
}

/// The wire wrapper around every message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub msg_type: u16,
    pub data: Value,
}

/// Payload of a [`ClientMessageType::SearchRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
}

/// Payload of a [`ClientMessageType::TrackDownloadRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackDownloadRequest {
    pub ticket: u32,
    pub username: String,
    pub filename: String,
}
