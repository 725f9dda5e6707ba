//! Audio Chunk
//!
//! The unit of audio moving through the turn pipeline: a sample rate paired
//! with mono samples normalized to `[-1.0, 1.0]`.

use std::time::Duration;

/// Scale factor for PCM16 to float conversion
const PCM16_SCALE: f32 = 32768.0;

/// A block of mono audio at a fixed sample rate.
///
/// Ownership moves with the chunk: producers build it, the sink consumes it
/// once. Zero-length chunks are never forwarded downstream; producers check
/// [`AudioChunk::is_empty`] before yielding.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl AudioChunk {
    /// Create a chunk from normalized samples.
    ///
    /// Samples outside `[-1.0, 1.0]` are clamped; `NaN` becomes silence.
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        debug_assert!(sample_rate > 0, "sample rate must be positive");
        let samples = samples
            .into_iter()
            .map(|s| if s.is_nan() { 0.0 } else { s.clamp(-1.0, 1.0) })
            .collect();
        Self {
            sample_rate,
            samples,
        }
    }

    /// Create a chunk from signed 16-bit PCM
    pub fn from_i16(sample_rate: u32, pcm: &[i16]) -> Self {
        let samples = pcm.iter().map(|&s| s as f32 / PCM16_SCALE).collect();
        Self {
            sample_rate,
            samples,
        }
    }

    /// A chunk of `len` zero samples
    pub fn silence(sample_rate: u32, len: usize) -> Self {
        Self {
            sample_rate,
            samples: vec![0.0; len],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration of this chunk
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Copy of this chunk holding at most the first `len` samples
    pub fn truncated(&self, len: usize) -> Self {
        let end = len.min(self.samples.len());
        Self {
            sample_rate: self.sample_rate,
            samples: self.samples[..end].to_vec(),
        }
    }

    /// Split into consecutive chunks of `chunk_ms` milliseconds.
    ///
    /// The last chunk may be shorter. Never produces an empty chunk.
    pub fn split(&self, chunk_ms: u32) -> Vec<AudioChunk> {
        let per_chunk = samples_per_chunk(self.sample_rate, chunk_ms);
        self.samples
            .chunks(per_chunk)
            .map(|window| AudioChunk {
                sample_rate: self.sample_rate,
                samples: window.to_vec(),
            })
            .collect()
    }

    /// Convert to signed 16-bit PCM
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s * (PCM16_SCALE - 1.0)).round() as i16)
            .collect()
    }
}

/// Number of samples in a `chunk_ms` window at `sample_rate`, at least one
pub fn samples_per_chunk(sample_rate: u32, chunk_ms: u32) -> usize {
    ((sample_rate as u64 * chunk_ms as u64) / 1000).max(1) as usize
}
