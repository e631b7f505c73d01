//! Stub providers — deterministic placeholders with no network dependency.
//!
//! Used during development and in tests so the full record → gate →
//! transcribe → reply flow can be exercised end-to-end without cloud
//! credentials.

use tracing::debug;

use crate::audio::{wav, PcmBuffer};
use crate::error::Result;
use crate::providers::{PromptService, SpeechToText, TextToSpeech, Transcript};

/// Echo-style speech-to-text stub.
///
/// Returns either a canned text or a deterministic description of the
/// payload it received.
#[derive(Debug, Default)]
pub struct StubSpeechToText {
    canned: Option<String>,
}

impl StubSpeechToText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `text` instead of the payload description.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            canned: Some(text.into()),
        }
    }
}

impl SpeechToText for StubSpeechToText {
    fn transcribe(&self, wav: &[u8]) -> Result<Transcript> {
        let text = self
            .canned
            .clone()
            .unwrap_or_else(|| format!("[stub transcript: {} WAV bytes]", wav.len()));
        debug!(wav_bytes = wav.len(), "StubSpeechToText::transcribe");
        Ok(Transcript {
            text,
            language: Some("en".into()),
        })
    }
}

/// Text-to-speech stub that emits a short silent WAV.
///
/// The output goes through the real encoder, so anything consuming stub
/// audio exercises the same container path as production output.
#[derive(Debug)]
pub struct StubTextToSpeech {
    sample_rate: u32,
}

impl StubTextToSpeech {
    pub fn new() -> Self {
        Self {
            sample_rate: 16_000,
        }
    }
}

impl Default for StubTextToSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl TextToSpeech for StubTextToSpeech {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        // 200 ms of 16-bit mono silence regardless of the text.
        let frames = self.sample_rate as usize / 5;
        let pcm = PcmBuffer::new(vec![0u8; frames * 2], self.sample_rate, 16, 1);
        debug!(chars = text.len(), frames, "StubTextToSpeech::synthesize");
        wav::encode(&pcm)
    }
}

/// Prompt stub that echoes the prompt back.
#[derive(Debug, Default)]
pub struct StubPromptService;

impl StubPromptService {
    pub fn new() -> Self {
        Self
    }
}

impl PromptService for StubPromptService {
    fn send_prompt(&self, prompt: &str) -> Result<String> {
        Ok(format!("[stub reply to: {prompt}]"))
    }
}
