//! Provider ports for the external speech services.
//!
//! These traits are the seams where cloud adapters (speech-to-text,
//! text-to-speech, conversational AI) plug in. The engine only ever talks
//! to the traits; the stub implementations in [`stub`] stand in during
//! development and tests. HTTP glue, retry policy, and authentication live
//! entirely on the adapter side.

pub mod stub;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of one transcription call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// Recognised text. May be empty when the provider heard nothing.
    pub text: String,
    /// Detected language code (e.g. "en"), if the provider reports one.
    pub language: Option<String>,
}

/// Speech-to-text port.
///
/// Receives a complete WAV container — the engine encodes PCM before the
/// hand-off, so adapters can forward the bytes to any API that expects a
/// file-shaped payload.
pub trait SpeechToText: Send + Sync {
    /// Transcribe a WAV byte stream.
    ///
    /// # Errors
    /// `Transcription` when the provider cannot process the audio.
    fn transcribe(&self, wav: &[u8]) -> Result<Transcript>;
}

/// Text-to-speech port.
pub trait TextToSpeech: Send + Sync {
    /// Convert text into audio bytes (typically a WAV or MP3 stream,
    /// provider-dependent).
    ///
    /// # Errors
    /// `Synthesis` when the provider fails.
    fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Whether the provider is configured and reachable.
    fn is_available(&self) -> bool {
        true
    }
}

/// Conversational AI port: one prompt in, one reply out.
pub trait PromptService: Send + Sync {
    /// Send a text prompt and return the reply.
    ///
    /// # Errors
    /// `Prompt` when the provider fails.
    fn send_prompt(&self, prompt: &str) -> Result<String>;
}
