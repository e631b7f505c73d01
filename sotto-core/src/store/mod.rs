//! Recording entity and the keyed store it lives in.

pub mod memory;

pub use memory::MemoryStore;

use crate::audio::PcmBuffer;

/// One captured recording: PCM payload plus the processing results attached
/// to it over its lifetime.
#[derive(Debug, Clone)]
pub struct Recording {
    id: String,
    pcm: PcmBuffer,
    transcript: Option<String>,
    language: Option<String>,
    reply: Option<String>,
}

impl Recording {
    pub fn new(id: impl Into<String>, pcm: PcmBuffer) -> Self {
        Self {
            id: id.into(),
            pcm,
            transcript: None,
            language: None,
            reply: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pcm(&self) -> &PcmBuffer {
        &self.pcm
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn reply(&self) -> Option<&str> {
        self.reply.as_deref()
    }

    pub fn set_transcript(&mut self, text: impl Into<String>, language: Option<String>) {
        self.transcript = Some(text.into());
        self.language = language;
    }

    pub fn set_reply(&mut self, reply: impl Into<String>) {
        self.reply = Some(reply.into());
    }

    /// Whether a non-blank transcript is attached.
    pub fn has_transcript(&self) -> bool {
        self.transcript
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Whether a non-blank AI reply is attached.
    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}

/// Keyed persistence for recordings.
///
/// `get` hands out a defensive clone: callers never alias the stored value.
pub trait RecordingStore: Send + Sync {
    /// Insert or replace the recording under its id.
    fn store(&self, recording: Recording);

    /// Fetch a copy of the recording, if present.
    fn get(&self, id: &str) -> Option<Recording>;

    /// Remove the recording. Returns whether it existed.
    fn clear(&self, id: &str) -> bool;
}
