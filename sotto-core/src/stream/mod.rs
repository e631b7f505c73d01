//! Byte accumulator for streamed audio chunks.
//!
//! Streaming callers push raw PCM chunks as they arrive; on flush the engine
//! drains the whole buffer at once. Push and drain are mutually exclusive
//! behind one lock, so a drain never observes a half-written chunk.

use parking_lot::Mutex;

use crate::error::{Result, SottoError};

/// Append-only chunk buffer with take-and-clear extraction.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    buf: Mutex<Vec<u8>>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk to the end of the buffer.
    ///
    /// # Errors
    /// `EmptyAudio` if the chunk contains no bytes.
    pub fn push(&self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Err(SottoError::EmptyAudio);
        }
        self.buf.lock().extend_from_slice(chunk);
        Ok(())
    }

    /// Take everything accumulated so far and leave the buffer empty.
    pub fn drain(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buf.lock())
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    /// Discard everything without returning it.
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}
