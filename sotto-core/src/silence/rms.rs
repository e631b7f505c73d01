//! RMS-based silence classifier using a double threshold.
//!
//! ## Algorithm
//!
//! 1. For each frame, read one sample per channel and normalize to
//!    [-1.0, 1.0] (8-bit unsigned, 16/24-bit signed little-endian).
//! 2. Average the absolute channel values into one amplitude per frame.
//! 3. A frame is silent when its amplitude is below `threshold`.
//! 4. The buffer is silent when the silent-frame fraction reaches
//!    `silent_ratio`.
//!
//! The overall RMS is computed alongside and logged for diagnostics; it does
//! not take part in the verdict.

use tracing::debug;

use super::SilenceDetector;
use crate::audio::PcmBuffer;
use crate::error::{Result, SottoError};

/// Per-frame amplitude below which a frame counts as silent (1 % of full scale).
const DEFAULT_THRESHOLD: f64 = 0.01;

/// Fraction of silent frames required for a silent verdict.
const DEFAULT_SILENT_RATIO: f64 = 0.95;

/// Whole-buffer silence classifier over normalized sample amplitudes.
#[derive(Debug, Clone)]
pub struct RmsSilenceDetector {
    /// Amplitude threshold in [0.0, 1.0]. Frames below it are silent.
    threshold: f64,
    /// Silent-frame fraction in [0.0, 1.0] at which the buffer is silent.
    silent_ratio: f64,
}

impl RmsSilenceDetector {
    /// Create a detector with explicit thresholds.
    ///
    /// # Parameters
    /// - `threshold`: per-frame amplitude gate. Default: `0.01`.
    /// - `silent_ratio`: aggregate gate. Default: `0.95`.
    pub fn new(threshold: f64, silent_ratio: f64) -> Self {
        Self {
            threshold,
            silent_ratio,
        }
    }
}

impl Default for RmsSilenceDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_SILENT_RATIO)
    }
}

impl SilenceDetector for RmsSilenceDetector {
    fn is_silent(&self, pcm: &PcmBuffer) -> Result<bool> {
        if pcm.bytes.is_empty() {
            return Ok(true);
        }
        if pcm.channels == 0 {
            return Err(SottoError::InvalidPcm(
                "channel count must be positive".into(),
            ));
        }

        let bytes_per_sample = match pcm.bits_per_sample {
            8 | 16 | 24 => pcm.bits_per_sample as usize / 8,
            other => return Err(SottoError::UnsupportedBitDepth(other)),
        };

        let frame_bytes = bytes_per_sample * pcm.channels as usize;
        let total_frames = pcm.bytes.len() / frame_bytes;
        if total_frames == 0 {
            return Ok(true);
        }

        let mut silent_frames = 0usize;
        let mut sum_squares = 0.0f64;
        let mut cursor = 0usize;

        for _ in 0..total_frames {
            let mut amplitude = 0.0f64;
            for _ in 0..pcm.channels {
                let sample = &pcm.bytes[cursor..cursor + bytes_per_sample];
                amplitude += sample_amplitude(sample, pcm.bits_per_sample).abs();
                cursor += bytes_per_sample;
            }
            amplitude /= pcm.channels as f64;

            if amplitude < self.threshold {
                silent_frames += 1;
            }
            sum_squares += amplitude * amplitude;
        }

        let rms = (sum_squares / total_frames as f64).sqrt();
        let silent_fraction = silent_frames as f64 / total_frames as f64;
        let verdict = silent_fraction >= self.silent_ratio;

        debug!(
            bytes = pcm.bytes.len(),
            sample_rate = pcm.sample_rate,
            bits = pcm.bits_per_sample,
            channels = pcm.channels,
            rms = format_args!("{rms:.4}"),
            silent_pct = format_args!("{:.2}", silent_fraction * 100.0),
            verdict,
            "silence classification"
        );

        Ok(verdict)
    }
}

/// Normalize one little-endian sample to [-1.0, 1.0].
///
/// 8-bit WAV samples are unsigned; 16- and 24-bit are signed two's
/// complement.
fn sample_amplitude(sample: &[u8], bits_per_sample: u16) -> f64 {
    match bits_per_sample {
        8 => (sample[0] as f64 - 128.0) / 128.0,
        16 => i16::from_le_bytes([sample[0], sample[1]]) as f64 / 32_768.0,
        24 => {
            // The i8 cast of the top byte sign-extends bit 23.
            let value = ((sample[2] as i8 as i32) << 16)
                | ((sample[1] as i32) << 8)
                | (sample[0] as i32);
            value as f64 / 8_388_608.0
        }
        _ => unreachable!("caller gates on supported bit depths"),
    }
}
