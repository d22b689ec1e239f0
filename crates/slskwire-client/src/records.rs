//! Typed records decoded from inbound message payloads.
//!
//! All four are immutable value records constructed exclusively from
//! decoded wire payloads and handed to subscribers by reference; the
//! router keeps nothing after a dispatch completes. Decoding is strict: a
//! missing required field or a mismatched type is a decode failure, not a
//! silently absent value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// One shared audio file offered by a peer.
///
/// The four audio attributes are nullable: the gateway fills in bitrate
/// and duration for compressed formats, sample rate and bit depth for
/// lossless ones. `attributes` is the raw encoder-specific attribute bag,
/// carried untyped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackInfo {
    /// Server-assigned correlation identifier. Opaque.
    #[serde(rename = "Id")]
    pub id: String,
    pub ticket: u32,
    pub username: String,
    pub filename: String,
    pub fullpath: String,
    pub extension: String,
    pub filesize: u64,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    pub bitrate: Option<u32>,
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u32>,
    pub duration: Option<u32>,
}

impl TrackInfo {
    /// Duration rendered as `m:ss`, when the track carries one.
    pub fn duration_display(&self) -> Option<String> {
        self.duration
            .map(|seconds| format!("{}:{:02}", seconds / 60, seconds % 60))
    }
}

/// One peer's reply to a search ticket.
///
/// `resultset` is always present; if any element fails to decode the
/// whole record fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    /// Server-assigned correlation identifier. Opaque.
    #[serde(rename = "Id")]
    pub id: String,
    pub query: String,
    pub ticket: u32,
    pub total_results: u32,
    pub current_results: u32,
    pub resultset: Vec<TrackInfo>,
}

/// Status values the gateway is known to report for downloads.
///
/// The `status` field itself stays an opaque string: this client carries
/// it to subscribers without interpreting it, and unknown values pass
/// through untouched.
pub mod download_status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

/// Status of one in-flight download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackDownloadInfo {
    pub ticket: u32,
    pub username: String,
    pub filename: String,
    pub status: String,
}

impl TrackDownloadInfo {
    /// Returns true for the known end states of a download.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            download_status::COMPLETED | download_status::FAILED
        )
    }
}

/// A server-reported logical error.
///
/// `fatal` signals whether the error terminates the logical session. It is
/// advisory: the client forwards it to subscribers and takes no action of
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerError {
    pub code: i32,
    pub msg: String,
    pub fatal: bool,
}

/// Decode an envelope's `data` into a record, tagging failures with the
/// record name.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    record: &'static str,
    data: Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError::Payload { record, source })
}
