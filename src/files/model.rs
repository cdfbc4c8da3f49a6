//! Data models for the Files API

use mime::Mime;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use time::OffsetDateTime;
use url::Url;

use crate::common::serde::{i64_as_string, mime_as_string};

/// Metadata for a file uploaded to the Files API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Resource name (e.g., "files/abc-123")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "mime_as_string::optional"
    )]
    pub mime_type: Option<Mime>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "i64_as_string::optional"
    )]
    pub size_bytes: Option<i64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub create_time: Option<OffsetDateTime>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub update_time: Option<OffsetDateTime>,

    /// Files are deleted by the service after this instant
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration_time: Option<OffsetDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_hash: Option<String>,

    /// URI used to reference the file in generation requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<Url>,

    /// Processing state; absent means unspecified
    #[serde(default)]
    pub state: FileState,

    /// Set when processing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

/// The processing state of an uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    /// File is being processed and cannot be used yet
    Processing,
    /// File is ready to be referenced in requests
    Active,
    /// Processing failed
    Failed,
    /// A state this client does not know about
    #[serde(other)]
    Unknown,
}

/// Error status attached to a failed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}
