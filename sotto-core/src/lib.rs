//! # sotto-core
//!
//! Voice-note engine SDK: WAV container codec, RMS silence gating, and
//! orchestration over pluggable speech providers.
//!
//! ## Architecture
//!
//! ```text
//! upload / chunks ──► wav::decode ─┐
//!                                  ├─► PcmBuffer ──► SilenceDetector
//! recorder PCM ────────────────────┘         │
//!                                      wav::encode
//!                                            │
//!                                   SpeechToText provider
//!                                            │
//!                                  PromptService (optional)
//!                                            │
//!                              broadcast::Sender<TranscriptEvent>
//! ```
//!
//! The codec and the classifier are pure, synchronous, and allocation-light;
//! everything stateful (store, stream buffer, event fan-out) lives in
//! [`engine::SottoEngine`].

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod engine;
pub mod error;
pub mod providers;
pub mod silence;
pub mod store;
pub mod stream;

// Convenience re-exports for downstream crates
pub use audio::{wav, PcmBuffer};
pub use engine::{events::TranscriptEvent, EngineConfig, Providers, SottoEngine};
pub use error::{Result, SottoError};
pub use providers::{PromptService, SpeechToText, TextToSpeech, Transcript};
pub use silence::{RmsSilenceDetector, SilenceDetector};
pub use store::{MemoryStore, Recording, RecordingStore};
pub use stream::ChunkAccumulator;
