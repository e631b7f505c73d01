//! Canonical WAV (RIFF/WAVE) container codec for PCM payloads.
//!
//! ## Layout produced by [`encode`]
//!
//! ```text
//! offset  size  field
//! 0       4     "RIFF"
//! 4       4     36 + data size (LE u32)
//! 8       4     "WAVE"
//! 12      4     "fmt "
//! 16      4     16 (LE u32, PCM fmt chunk size)
//! 20      2     1  (LE u16, PCM format code)
//! 22      2     channels
//! 24      4     sample rate
//! 28      4     byte rate
//! 32      2     block align
//! 34      2     bits per sample
//! 36      4     "data"
//! 40      4     data size (LE u32)
//! 44      …     PCM payload, verbatim
//! ```
//!
//! [`decode`] accepts any chunk ordering after the 12-byte prologue: a single
//! walker visits each chunk by its declared length (odd sizes are padded to
//! even per the RIFF rule) and picks up the first `fmt ` and first `data`
//! chunk it sees. Unknown chunks are skipped, never parsed.

use std::path::Path;

use crate::audio::PcmBuffer;
use crate::error::{Result, SottoError};

/// RIFF/WAVE prologue: "RIFF" + file size + "WAVE".
const PROLOGUE_LEN: usize = 12;

/// Fixed header length for the canonical PCM container we emit.
const HEADER_LEN: usize = 44;

/// Minimum `fmt ` chunk body for PCM.
const FMT_BODY_LEN: usize = 16;

/// WAVE format code for uncompressed PCM.
const FORMAT_PCM: u16 = 1;

/// Encode a PCM buffer into a canonical 44-byte-header WAV container.
///
/// The output length is exactly `44 + pcm.bytes.len()`. Deterministic, no
/// side effects.
///
/// # Errors
/// `InvalidPcm` if the metadata cannot describe a meaningful container:
/// zero sample rate or channel count, a bit depth that is zero or not
/// byte-aligned, or a payload too large for the u32 size fields.
pub fn encode(pcm: &PcmBuffer) -> Result<Vec<u8>> {
    if pcm.sample_rate == 0 {
        return Err(SottoError::InvalidPcm("sample rate must be positive".into()));
    }
    if pcm.channels == 0 {
        return Err(SottoError::InvalidPcm("channel count must be positive".into()));
    }
    if pcm.bits_per_sample == 0 || pcm.bits_per_sample % 8 != 0 {
        return Err(SottoError::InvalidPcm(format!(
            "bits per sample must be a positive multiple of 8, got {}",
            pcm.bits_per_sample
        )));
    }
    if pcm.bytes.len() as u64 > (u32::MAX as u64 - 36) {
        return Err(SottoError::InvalidPcm(
            "payload too large for the WAV u32 size fields".into(),
        ));
    }

    let data_len = pcm.bytes.len() as u32;
    // Integer truncation in the byte rate is allowed; compute wide to avoid
    // overflow on extreme rates.
    let byte_rate = (pcm.sample_rate as u64 * pcm.channels as u64 * pcm.bits_per_sample as u64 / 8)
        as u32;
    let block_align = pcm.channels * (pcm.bits_per_sample / 8);

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.bytes.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&(FMT_BODY_LEN as u32).to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&pcm.channels.to_le_bytes());
    out.extend_from_slice(&pcm.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&pcm.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&pcm.bytes);

    debug_assert_eq!(out.len(), HEADER_LEN + pcm.bytes.len());
    Ok(out)
}

/// Decode a WAV byte stream back into a PCM buffer plus format metadata.
///
/// Only PCM (format code 1) containers are accepted. Chunk order after the
/// prologue is irrelevant; unknown chunks are skipped by their declared
/// length. The first `fmt ` and first `data` chunk win.
///
/// # Errors
/// - `InvalidFormat` — missing/garbled RIFF/WAVE prologue, undersized or
///   truncated `fmt ` chunk.
/// - `UnsupportedFormat` — format code other than 1 (PCM).
/// - `MissingChunk` — no `fmt ` or no `data` chunk before the stream ends.
/// - `InvalidData` — `data` chunk size overruns the buffer.
pub fn decode(bytes: &[u8]) -> Result<PcmBuffer> {
    validate_prologue(bytes)?;

    let mut fmt: Option<FmtFields> = None;
    let mut data: Option<&[u8]> = None;

    for chunk in ChunkWalker::new(bytes) {
        match &chunk.id {
            b"fmt " if fmt.is_none() => {
                fmt = Some(parse_fmt(bytes, &chunk)?);
            }
            b"data" if data.is_none() => {
                let end = chunk
                    .body_offset
                    .checked_add(chunk.size)
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| {
                        SottoError::InvalidData(format!(
                            "declared size {} overruns buffer of {} bytes",
                            chunk.size,
                            bytes.len()
                        ))
                    })?;
                data = Some(&bytes[chunk.body_offset..end]);
            }
            _ => {}
        }
        if fmt.is_some() && data.is_some() {
            break;
        }
    }

    let fmt = fmt.ok_or(SottoError::MissingChunk("fmt"))?;
    let data = data.ok_or(SottoError::MissingChunk("data"))?;

    Ok(PcmBuffer::new(
        data.to_vec(),
        fmt.sample_rate,
        fmt.bits_per_sample,
        fmt.channels,
    ))
}

/// Read a WAV file from disk and return its raw bytes.
///
/// Only the 12-byte RIFF/WAVE prologue is validated here — full parsing is
/// the caller's next step via [`decode`].
///
/// # Errors
/// `Io` for missing/unreadable paths, `InvalidFormat` if the file does not
/// start with a RIFF/WAVE prologue.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path.as_ref())?;
    validate_prologue(&bytes)?;
    Ok(bytes)
}

fn validate_prologue(bytes: &[u8]) -> Result<()> {
    if bytes.len() < PROLOGUE_LEN {
        return Err(SottoError::InvalidFormat(format!(
            "{} bytes is too small for a RIFF/WAVE prologue",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(SottoError::InvalidFormat("missing RIFF header".into()));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(SottoError::InvalidFormat(
            "missing WAVE format identifier".into(),
        ));
    }
    Ok(())
}

/// Format metadata pulled from a `fmt ` chunk. Byte rate and block align are
/// present in the stream but derived values — the decoder ignores them.
struct FmtFields {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

fn parse_fmt(bytes: &[u8], chunk: &RawChunk) -> Result<FmtFields> {
    if chunk.size < FMT_BODY_LEN {
        return Err(SottoError::InvalidFormat(format!(
            "fmt chunk size {} is smaller than the {} bytes PCM requires",
            chunk.size, FMT_BODY_LEN
        )));
    }
    let body = chunk.body_offset;
    if body + FMT_BODY_LEN > bytes.len() {
        return Err(SottoError::InvalidFormat("fmt chunk is truncated".into()));
    }

    let audio_format = read_u16_le(bytes, body);
    if audio_format != FORMAT_PCM {
        return Err(SottoError::UnsupportedFormat(audio_format));
    }

    Ok(FmtFields {
        channels: read_u16_le(bytes, body + 2),
        sample_rate: read_u32_le(bytes, body + 4),
        // byte rate (body + 8) and block align (body + 12) skipped
        bits_per_sample: read_u16_le(bytes, body + 14),
    })
}

/// One chunk header as seen by the walker. `size` is the declared body size;
/// the body may overrun the buffer — consumers must bounds-check.
struct RawChunk {
    id: [u8; 4],
    size: usize,
    body_offset: usize,
}

/// Walks RIFF sub-chunks starting after the 12-byte prologue.
///
/// Advances `8 + size + (size & 1)` per chunk: RIFF pads odd-sized chunk
/// bodies to even length, so the pad byte is consumed but never yielded.
/// Stops as soon as a full 8-byte chunk header no longer fits.
struct ChunkWalker<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ChunkWalker<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: PROLOGUE_LEN,
        }
    }
}

impl Iterator for ChunkWalker<'_> {
    type Item = RawChunk;

    fn next(&mut self) -> Option<RawChunk> {
        let header_end = self.offset.checked_add(8)?;
        if header_end > self.bytes.len() {
            return None;
        }

        let mut id = [0u8; 4];
        id.copy_from_slice(&self.bytes[self.offset..self.offset + 4]);
        let size = read_u32_le(self.bytes, self.offset + 4) as usize;
        let body_offset = self.offset + 8;

        // A bogus declared size can push the cursor past the end; the next
        // call then reports the stream exhausted.
        self.offset = body_offset
            .checked_add(size)
            .and_then(|end| end.checked_add(size & 1))
            .unwrap_or(usize::MAX);

        Some(RawChunk {
            id,
            size,
            body_offset,
        })
    }
}

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
