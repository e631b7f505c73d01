//! Persistent CLI settings (JSON file next to the working directory, or
//! wherever `SOTTO_SETTINGS` points).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sotto_core::EngineConfig;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct CliSettings {
    pub stream_sample_rate: u32,
    pub stream_bits_per_sample: u16,
    pub stream_channels: u16,
    pub silence_threshold: f64,
    pub silent_frame_ratio: f64,
    pub drop_silent_streams: bool,
    pub forward_transcripts: bool,
}

impl Default for CliSettings {
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

impl CliSettings {
    /// Clamp every field into its working range.
    pub fn normalize(&mut self) {
        self.stream_sample_rate = self.stream_sample_rate.clamp(8_000, 192_000);
        if ![8, 16, 24].contains(&self.stream_bits_per_sample) {
            self.stream_bits_per_sample = 16;
        }
        self.stream_channels = self.stream_channels.clamp(1, 8);
        self.silence_threshold = self.silence_threshold.clamp(0.0, 1.0);
        self.silent_frame_ratio = self.silent_frame_ratio.clamp(0.0, 1.0);
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            stream_sample_rate: self.stream_sample_rate,
            stream_bits_per_sample: self.stream_bits_per_sample,
            stream_channels: self.stream_channels,
            silence_threshold: self.silence_threshold,
            silent_frame_ratio: self.silent_frame_ratio,
            drop_silent_streams: self.drop_silent_streams,
            forward_transcripts: self.forward_transcripts,
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    std::env::var_os("SOTTO_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sotto.json"))
}

/// Load settings, falling back to defaults on a missing or unreadable file.
pub fn load_settings(path: &Path) -> CliSettings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<CliSettings>(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings file unreadable — using defaults");
                CliSettings::default()
            }
        },
        Err(_) => CliSettings::default(),
    };
    settings.normalize();
    settings
}
