use thiserror::Error;

/// All errors produced by sotto-core.
#[derive(Debug, Error)]
pub enum SottoError {
    #[error("invalid WAV format: {0}")]
    InvalidFormat(String),

    #[error("unsupported audio format code {0} (only PCM is supported)")]
    UnsupportedFormat(u16),

    #[error("missing {0} chunk in WAV stream")]
    MissingChunk(&'static str),

    #[error("invalid data chunk: {0}")]
    InvalidData(String),

    #[error("invalid PCM metadata: {0}")]
    InvalidPcm(String),

    #[error("unsupported bit depth: {0} bits per sample")]
    UnsupportedBitDepth(u16),

    #[error("audio buffer is empty")]
    EmptyAudio,

    #[error("recording id cannot be blank")]
    BlankRecordingId,

    #[error("recording not found: {id}")]
    RecordingNotFound { id: String },

    #[error("transcription provider error: {0}")]
    Transcription(String),

    #[error("synthesis provider error: {0}")]
    Synthesis(String),

    #[error("text-to-speech provider is not available")]
    SynthesisUnavailable,

    #[error("prompt provider error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SottoError>;
