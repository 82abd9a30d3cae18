use std::path::Path;
use std::sync::Arc;

use super::audio_decoder::DecodeError;
use crate::shared::content_hash::ContentHash;

/// Encoded audio waiting to be decoded: raw bytes plus a format hint.
///
/// Both bundled samples and uploads end up here, so decoding and caching
/// only ever see bytes. Identity for caching is the content, never the
/// origin label.
#[derive(Clone, Debug)]
pub struct AudioSource {
    bytes: Arc<[u8]>,
    extension: Option<String>,
    origin: String,
}

impl AudioSource {
    /// Wraps an uploaded byte stream with its declared extension.
    pub fn from_bytes(
        bytes: impl Into<Arc<[u8]>>,
        extension: Option<&str>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            extension: extension.map(|e| e.trim_start_matches('.').to_lowercase()),
            origin: origin.into(),
        }
    }

    /// Reads a file fully into memory, taking the hint from its extension.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path).map_err(|e| DecodeError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let extension = path.extension().and_then(|e| e.to_str());
        Ok(Self::from_bytes(bytes, extension, path.display().to_string()))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        self.bytes.clone()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Human-readable origin (path or upload name), for logs and errors only.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_bytes(&self.bytes)
    }
}
