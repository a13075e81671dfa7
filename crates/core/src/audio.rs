//! Audio buffer types
//!
//! Turns are processed as complete utterances, so audio is carried as an
//! opaque encoded buffer rather than decoded sample frames.

use serde::{Deserialize, Serialize};

/// An opaque buffer of encoded speech
///
/// The contents are whatever encoding the speech provider produced or
/// accepts (MP3 by default); nothing in this workspace decodes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioClip {
    /// Encoded audio bytes
    pub bytes: Vec<u8>,
    /// MIME type of the encoding
    pub mime_type: String,
}

impl AudioClip {
    /// Create a clip with an explicit MIME type
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Create an MP3 clip (the default provider encoding)
    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "audio/mpeg")
    }

    /// Byte length of the encoded audio
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the clip carries no audio at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
