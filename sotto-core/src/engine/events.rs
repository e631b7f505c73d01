//! Event types broadcast by the engine.
//!
//! Subscribers (UI hosts, logging sinks) receive one `TranscriptEvent` per
//! completed transcription, in sequence order.

use serde::{Deserialize, Serialize};

/// Emitted whenever a recording gains a transcript (and, when prompt
/// forwarding is on, an AI reply).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Id of the recording this transcript belongs to.
    pub recording_id: String,
    /// Recognised text.
    pub text: String,
    /// Detected language code, if the provider reports one.
    pub language: Option<String>,
    /// AI reply to the transcript, when prompt forwarding produced one.
    pub reply: Option<String>,
}
