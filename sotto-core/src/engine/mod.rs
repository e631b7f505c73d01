//! `SottoEngine` — orchestration over the codec, classifier, store, and
//! provider ports.
//!
//! ## Flows
//!
//! ```text
//! upload:    ingest_wav ──decode──► Recording ──► store
//! record:    begin_recording ──► store ──► transcribe_recording
//! stream:    push_chunk* ──► flush_stream ──silence gate──► transcribe
//! speak:     synthesize ──► TextToSpeech provider
//!
//! transcribe_recording:
//!     store.get ──► wav::encode ──► SpeechToText ──► store update
//!                                        │
//!                            PromptService (optional)
//!                                        │
//!                        broadcast::Sender<TranscriptEvent>
//! ```
//!
//! The engine is `Send + Sync` — all fields use interior mutability. Wrap in
//! `Arc<SottoEngine>` to share between request handlers and event consumers.

pub mod events;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    audio::{wav, PcmBuffer},
    error::{Result, SottoError},
    providers::{PromptService, SpeechToText, TextToSpeech},
    silence::{RmsSilenceDetector, SilenceDetector},
    store::{MemoryStore, Recording, RecordingStore},
    stream::ChunkAccumulator,
};

use events::TranscriptEvent;

/// Broadcast channel capacity: transcript events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Configuration for `SottoEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample rate assumed for streamed PCM chunks (Hz). Default: 44100.
    pub stream_sample_rate: u32,
    /// Bit depth assumed for streamed PCM chunks. Default: 16.
    pub stream_bits_per_sample: u16,
    /// Channel count assumed for streamed PCM chunks. Default: 1.
    pub stream_channels: u16,
    /// Per-frame amplitude threshold for the silence gate. Default: 0.01.
    pub silence_threshold: f64,
    /// Silent-frame fraction at which a buffer is silent. Default: 0.95.
    pub silent_frame_ratio: f64,
    /// Whether `flush_stream` drops buffers the classifier calls silent.
    /// Default: true.
    pub drop_silent_streams: bool,
    /// Whether transcripts are forwarded to the prompt provider.
    /// Default: true.
    pub forward_transcripts: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream_sample_rate: 44_100,
            stream_bits_per_sample: 16,
            stream_channels: 1,
            silence_threshold: 0.01,
            silent_frame_ratio: 0.95,
            drop_silent_streams: true,
            forward_transcripts: true,
        }
    }
}

/// The provider ports an engine is wired to.
pub struct Providers {
    pub speech_to_text: Arc<dyn SpeechToText>,
    pub text_to_speech: Arc<dyn TextToSpeech>,
    /// Optional — when absent, transcripts are never forwarded.
    pub prompts: Option<Arc<dyn PromptService>>,
}

/// The top-level engine handle.
pub struct SottoEngine {
    config: EngineConfig,
    store: Arc<dyn RecordingStore>,
    detector: Arc<dyn SilenceDetector>,
    providers: Providers,
    accumulator: ChunkAccumulator,
    transcript_tx: broadcast::Sender<TranscriptEvent>,
    seq: AtomicU64,
}

impl SottoEngine {
    /// Create an engine with an in-memory store and the RMS classifier
    /// configured from `config`.
    pub fn new(config: EngineConfig, providers: Providers) -> Self {
        let detector = Arc::new(RmsSilenceDetector::new(
            config.silence_threshold,
            config.silent_frame_ratio,
        ));
        Self::with_store(config, providers, Arc::new(MemoryStore::new()), detector)
    }

    /// Create an engine over a caller-supplied store and classifier.
    pub fn with_store(
        config: EngineConfig,
        providers: Providers,
        store: Arc<dyn RecordingStore>,
        detector: Arc<dyn SilenceDetector>,
    ) -> Self {
        let (transcript_tx, _) = broadcast::channel(BROADCAST_CAP);
        Self {
            config,
            store,
            detector,
            providers,
            accumulator: ChunkAccumulator::new(),
            transcript_tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to transcript events.
    pub fn subscribe_transcripts(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.transcript_tx.subscribe()
    }

    // ── Recording lifecycle ──────────────────────────────────────────────

    /// Store a new PCM recording under a generated id.
    ///
    /// # Errors
    /// - `EmptyAudio` for an empty payload.
    /// - `InvalidPcm` for zero sample rate, bit depth, or channel count.
    pub fn begin_recording(&self, pcm: PcmBuffer) -> Result<Recording> {
        if pcm.bytes.is_empty() {
            return Err(SottoError::EmptyAudio);
        }
        validate_metadata(&pcm)?;

        let id = generate_recording_id();
        let recording = Recording::new(id, pcm);
        self.store.store(recording.clone());
        debug!(
            id = recording.id(),
            bytes = recording.pcm().bytes.len(),
            "recording stored"
        );
        Ok(recording)
    }

    /// Fetch a copy of a stored recording.
    pub fn recording(&self, id: &str) -> Option<Recording> {
        self.store.get(id)
    }

    /// Remove a recording. Returns whether it existed.
    pub fn discard_recording(&self, id: &str) -> bool {
        self.store.clear(id)
    }

    /// Decode a WAV byte stream and store the result under `id`.
    ///
    /// # Errors
    /// `BlankRecordingId`, `EmptyAudio`, or any decoder error.
    pub fn ingest_wav(&self, bytes: &[u8], id: &str) -> Result<Recording> {
        if id.trim().is_empty() {
            return Err(SottoError::BlankRecordingId);
        }
        if bytes.is_empty() {
            return Err(SottoError::EmptyAudio);
        }

        let pcm = wav::decode(bytes)?;
        let recording = Recording::new(id, pcm);
        self.store.store(recording.clone());
        debug!(id, bytes = bytes.len(), "WAV ingested");
        Ok(recording)
    }

    /// Encode a stored recording to WAV, transcribe it, and (optionally)
    /// forward the transcript to the prompt provider.
    ///
    /// The transcript is persisted before the prompt call: a prompt failure
    /// surfaces as an error, but the transcription result is already safe in
    /// the store.
    ///
    /// # Errors
    /// `BlankRecordingId`, `RecordingNotFound`, encoder errors, provider
    /// errors.
    pub fn transcribe_recording(&self, id: &str) -> Result<Recording> {
        if id.trim().is_empty() {
            return Err(SottoError::BlankRecordingId);
        }
        let mut recording = self
            .store
            .get(id)
            .ok_or_else(|| SottoError::RecordingNotFound { id: id.to_owned() })?;

        let container = wav::encode(recording.pcm())?;
        let transcript = self.providers.speech_to_text.transcribe(&container)?;
        info!(
            id,
            chars = transcript.text.len(),
            language = transcript.language.as_deref().unwrap_or("unknown"),
            "transcription complete"
        );
        recording.set_transcript(transcript.text, transcript.language);
        self.store.store(recording.clone());

        if self.config.forward_transcripts && recording.has_transcript() {
            if let Some(prompts) = &self.providers.prompts {
                let text = recording.transcript().unwrap_or_default();
                match prompts.send_prompt(text) {
                    Ok(reply) => {
                        recording.set_reply(reply);
                        self.store.store(recording.clone());
                    }
                    Err(e) => {
                        warn!(id, error = %e, "prompt forwarding failed after transcription");
                        self.emit(&recording);
                        return Err(SottoError::Prompt(format!(
                            "transcript stored but prompt forwarding failed: {e}"
                        )));
                    }
                }
            }
        }

        self.emit(&recording);
        Ok(recording)
    }

    // ── Silence gate ─────────────────────────────────────────────────────

    /// Classify a buffer as silent. Empty buffers short-circuit to `true`
    /// without touching the classifier.
    pub fn check_silence(&self, pcm: &PcmBuffer) -> Result<bool> {
        if pcm.bytes.is_empty() {
            return Ok(true);
        }
        self.detector.is_silent(pcm)
    }

    // ── Streaming ────────────────────────────────────────────────────────

    /// Append one streamed PCM chunk (at the configured stream format).
    ///
    /// # Errors
    /// `EmptyAudio` for an empty chunk.
    pub fn push_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.accumulator.push(chunk)
    }

    /// Bytes currently buffered for the stream.
    pub fn stream_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Drain the stream buffer and run it through the pipeline.
    ///
    /// Returns `None` when nothing was buffered, or when the silence gate is
    /// on and the buffer classified silent (the bytes are dropped).
    /// Otherwise the buffer is stored as a recording and transcribed.
    ///
    /// # Errors
    /// Classifier or transcription errors. The drained bytes are not
    /// restored on error.
    pub fn flush_stream(&self) -> Result<Option<Recording>> {
        let bytes = self.accumulator.drain();
        if bytes.is_empty() {
            return Ok(None);
        }

        let pcm = PcmBuffer::new(
            bytes,
            self.config.stream_sample_rate,
            self.config.stream_bits_per_sample,
            self.config.stream_channels,
        );

        if self.config.drop_silent_streams && self.detector.is_silent(&pcm)? {
            debug!(bytes = pcm.bytes.len(), "silent stream buffer dropped");
            return Ok(None);
        }

        let recording = self.begin_recording(pcm)?;
        let recording = self.transcribe_recording(recording.id())?;
        Ok(Some(recording))
    }

    // ── Synthesis ────────────────────────────────────────────────────────

    /// Convert text to speech audio via the synthesis provider.
    ///
    /// # Errors
    /// `Synthesis` for blank text, `SynthesisUnavailable` when the provider
    /// reports itself unavailable, provider errors otherwise.
    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(SottoError::Synthesis("text cannot be empty".into()));
        }
        if !self.providers.text_to_speech.is_available() {
            return Err(SottoError::SynthesisUnavailable);
        }
        self.providers.text_to_speech.synthesize(text)
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn emit(&self, recording: &Recording) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = TranscriptEvent {
            seq,
            recording_id: recording.id().to_owned(),
            text: recording.transcript().unwrap_or_default().to_owned(),
            language: recording.language().map(ToOwned::to_owned),
            reply: recording.reply().map(ToOwned::to_owned),
        };
        // No subscribers is fine — events are best-effort.
        let _ = self.transcript_tx.send(event);
    }
}

fn validate_metadata(pcm: &PcmBuffer) -> Result<()> {
    if pcm.sample_rate == 0 {
        return Err(SottoError::InvalidPcm("sample rate must be positive".into()));
    }
    if pcm.bits_per_sample == 0 {
        return Err(SottoError::InvalidPcm(
            "bits per sample must be positive".into(),
        ));
    }
    if pcm.channels == 0 {
        return Err(SottoError::InvalidPcm("channel count must be positive".into()));
    }
    Ok(())
}

fn generate_recording_id() -> String {
    format!("rec-{:016x}", rand::random::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    use crate::providers::{
        stub::{StubPromptService, StubSpeechToText, StubTextToSpeech},
        Transcript,
    };

    /// Records the payload sizes it was handed; replies with fixed text.
    struct ScriptedSpeechToText {
        payload_sizes: Arc<Mutex<Vec<usize>>>,
        text: String,
    }

    impl SpeechToText for ScriptedSpeechToText {
        fn transcribe(&self, wav: &[u8]) -> Result<Transcript> {
            self.payload_sizes.lock().push(wav.len());
            Ok(Transcript {
                text: self.text.clone(),
                language: Some("en".into()),
            })
        }
    }

    struct FailingPromptService;

    impl PromptService for FailingPromptService {
        fn send_prompt(&self, _prompt: &str) -> Result<String> {
            Err(SottoError::Prompt("intentional test failure".into()))
        }
    }

    struct UnavailableTextToSpeech;

    impl TextToSpeech for UnavailableTextToSpeech {
        fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            unreachable!("must not be called when unavailable")
        }

        fn is_available(&self) -> bool {
            false
        }
    }

    fn stub_providers() -> Providers {
        Providers {
            speech_to_text: Arc::new(StubSpeechToText::with_text("hello world")),
            text_to_speech: Arc::new(StubTextToSpeech::new()),
            prompts: Some(Arc::new(StubPromptService::new())),
        }
    }

    fn loud_pcm(frames: usize) -> PcmBuffer {
        let bytes = std::iter::repeat(12_000i16.to_le_bytes())
            .take(frames)
            .flatten()
            .collect();
        PcmBuffer::new(bytes, 44_100, 16, 1)
    }

    fn silent_pcm(frames: usize) -> PcmBuffer {
        PcmBuffer::new(vec![0; frames * 2], 44_100, 16, 1)
    }

    #[test]
    fn begin_recording_validates_and_stores() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());

        let recording = engine.begin_recording(loud_pcm(100)).unwrap();
        assert!(recording.id().starts_with("rec-"));
        assert!(engine.recording(recording.id()).is_some());

        assert!(matches!(
            engine.begin_recording(PcmBuffer::new(vec![], 44_100, 16, 1)),
            Err(SottoError::EmptyAudio)
        ));
        assert!(matches!(
            engine.begin_recording(PcmBuffer::new(vec![0, 0], 0, 16, 1)),
            Err(SottoError::InvalidPcm(_))
        ));
    }

    #[test]
    fn transcribe_recording_encodes_before_the_provider_call() {
        let payload_sizes = Arc::new(Mutex::new(Vec::new()));
        let providers = Providers {
            speech_to_text: Arc::new(ScriptedSpeechToText {
                payload_sizes: Arc::clone(&payload_sizes),
                text: "words".into(),
            }),
            text_to_speech: Arc::new(StubTextToSpeech::new()),
            prompts: None,
        };
        let engine = SottoEngine::new(EngineConfig::default(), providers);

        let recording = engine.begin_recording(loud_pcm(100)).unwrap();
        let transcribed = engine.transcribe_recording(recording.id()).unwrap();

        // 100 16-bit mono frames + the 44-byte header.
        assert_eq!(&*payload_sizes.lock(), &vec![244]);
        assert_eq!(transcribed.transcript(), Some("words"));
        assert_eq!(transcribed.language(), Some("en"));
        assert!(engine.recording(recording.id()).unwrap().has_transcript());
    }

    #[test]
    fn transcribe_recording_forwards_to_prompt_provider() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        let recording = engine.begin_recording(loud_pcm(100)).unwrap();

        let transcribed = engine.transcribe_recording(recording.id()).unwrap();
        assert_eq!(
            transcribed.reply(),
            Some("[stub reply to: hello world]")
        );
    }

    #[test]
    fn prompt_forwarding_can_be_disabled() {
        let config = EngineConfig {
            forward_transcripts: false,
            ..EngineConfig::default()
        };
        let engine = SottoEngine::new(config, stub_providers());
        let recording = engine.begin_recording(loud_pcm(100)).unwrap();

        let transcribed = engine.transcribe_recording(recording.id()).unwrap();
        assert!(transcribed.reply().is_none());
    }

    #[test]
    fn prompt_failure_keeps_the_stored_transcript() {
        let providers = Providers {
            speech_to_text: Arc::new(StubSpeechToText::with_text("kept")),
            text_to_speech: Arc::new(StubTextToSpeech::new()),
            prompts: Some(Arc::new(FailingPromptService)),
        };
        let engine = SottoEngine::new(EngineConfig::default(), providers);
        let recording = engine.begin_recording(loud_pcm(100)).unwrap();

        let err = engine.transcribe_recording(recording.id()).unwrap_err();
        assert!(matches!(err, SottoError::Prompt(_)));

        let stored = engine.recording(recording.id()).unwrap();
        assert_eq!(stored.transcript(), Some("kept"));
        assert!(stored.reply().is_none());
    }

    #[test]
    fn transcribe_rejects_blank_and_unknown_ids() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        assert!(matches!(
            engine.transcribe_recording("  "),
            Err(SottoError::BlankRecordingId)
        ));
        assert!(matches!(
            engine.transcribe_recording("rec-missing"),
            Err(SottoError::RecordingNotFound { .. })
        ));
    }

    #[test]
    fn ingest_wav_decodes_and_stores() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        let container = wav::encode(&loud_pcm(10)).unwrap();

        let recording = engine.ingest_wav(&container, "upload-1").unwrap();
        assert_eq!(recording.id(), "upload-1");
        assert_eq!(recording.pcm().sample_rate, 44_100);
        assert_eq!(recording.pcm().bytes.len(), 20);

        assert!(matches!(
            engine.ingest_wav(&container, " "),
            Err(SottoError::BlankRecordingId)
        ));
        assert!(matches!(
            engine.ingest_wav(&[], "upload-2"),
            Err(SottoError::EmptyAudio)
        ));
    }

    #[test]
    fn flush_stream_drops_silent_buffers() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());

        engine.push_chunk(&silent_pcm(500).bytes).unwrap();
        assert_eq!(engine.stream_len(), 1000);
        assert!(engine.flush_stream().unwrap().is_none());
        assert_eq!(engine.stream_len(), 0);
    }

    #[test]
    fn flush_stream_transcribes_buffers_with_sound() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());

        engine.push_chunk(&loud_pcm(300).bytes).unwrap();
        engine.push_chunk(&loud_pcm(200).bytes).unwrap();

        let recording = engine.flush_stream().unwrap().expect("loud buffer kept");
        assert_eq!(recording.pcm().bytes.len(), 1000);
        assert_eq!(recording.transcript(), Some("hello world"));
        assert_eq!(engine.stream_len(), 0);
    }

    #[test]
    fn flush_stream_on_empty_buffer_is_a_no_op() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        assert!(engine.flush_stream().unwrap().is_none());
    }

    #[test]
    fn silence_gate_can_be_disabled() {
        let config = EngineConfig {
            drop_silent_streams: false,
            ..EngineConfig::default()
        };
        let engine = SottoEngine::new(config, stub_providers());

        engine.push_chunk(&silent_pcm(500).bytes).unwrap();
        let recording = engine.flush_stream().unwrap();
        assert!(recording.is_some(), "gate off — silent buffer still kept");
    }

    #[test]
    fn check_silence_short_circuits_on_empty() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        // Metadata the classifier would reject — never reached for empty bytes.
        let pcm = PcmBuffer::new(vec![], 44_100, 32, 1);
        assert!(engine.check_silence(&pcm).unwrap());

        assert!(engine.check_silence(&silent_pcm(100)).unwrap());
        assert!(!engine.check_silence(&loud_pcm(100)).unwrap());
    }

    #[test]
    fn synthesize_validates_text_and_availability() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        assert!(matches!(
            engine.synthesize("   "),
            Err(SottoError::Synthesis(_))
        ));
        assert!(!engine.synthesize("say this").unwrap().is_empty());

        let providers = Providers {
            speech_to_text: Arc::new(StubSpeechToText::new()),
            text_to_speech: Arc::new(UnavailableTextToSpeech),
            prompts: None,
        };
        let engine = SottoEngine::new(EngineConfig::default(), providers);
        assert!(matches!(
            engine.synthesize("say this"),
            Err(SottoError::SynthesisUnavailable)
        ));
    }

    #[test]
    fn transcript_events_carry_increasing_sequence_numbers() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        let mut rx = engine.subscribe_transcripts();

        let first = engine.begin_recording(loud_pcm(100)).unwrap();
        engine.transcribe_recording(first.id()).unwrap();
        let second = engine.begin_recording(loud_pcm(100)).unwrap();
        engine.transcribe_recording(second.id()).unwrap();

        let event_a = rx.try_recv().expect("first event");
        let event_b = rx.try_recv().expect("second event");
        assert_eq!(event_a.seq, 0);
        assert_eq!(event_b.seq, 1);
        assert_eq!(event_a.recording_id, first.id());
        assert_eq!(event_b.recording_id, second.id());
        assert_eq!(event_a.text, "hello world");
        assert_eq!(
            event_a.reply.as_deref(),
            Some("[stub reply to: hello world]")
        );
    }

    #[test]
    fn discard_recording_removes_it() {
        let engine = SottoEngine::new(EngineConfig::default(), stub_providers());
        let recording = engine.begin_recording(loud_pcm(10)).unwrap();

        assert!(engine.discard_recording(recording.id()));
        assert!(!engine.discard_recording(recording.id()));
        assert!(engine.recording(recording.id()).is_none());
    }
}
