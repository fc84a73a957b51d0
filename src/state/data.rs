/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the backend layer and the UI layer. Field names are serialized in
/// camelCase, which is the shape sessions are stored in.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Assignment of item paths to destination names (latest assignment wins)
pub type ClassificationMap = BTreeMap<String, String>;

/// A single file in the source folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Full path to the file, unique within a session
    pub path: String,
    /// Filename only (e.g., "f0012345.jpg")
    pub name: String,
    /// File size in bytes
    #[serde(default)]
    pub size: u64,
}

/// A named target folder with its single-character hotkey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub name: String,
    /// Always stored lowercase
    pub key: char,
    pub path: String,
}

/// Persisted, resumable progress for one source folder
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub source_path: String,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub classifications: ClassificationMap,
    #[serde(default)]
    pub current_index: usize,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_saved: i64,
}

/// Everything the backend needs to commit a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    pub source_path: String,
    pub destinations: Vec<Destination>,
    pub classifications: ClassificationMap,
}

/// Outcome of a finalize run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub copied: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub failed: usize,
}

impl SortResult {
    /// A result carrying only the success flag and message
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            ..Self::default()
        }
    }
}

/// File facts shown under the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaMetadata {
    pub size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Decoded content for the currently displayed item
#[derive(Debug, Clone, PartialEq)]
pub struct MediaContent {
    pub path: String,
    pub bytes: Vec<u8>,
    pub metadata: MediaMetadata,
}
