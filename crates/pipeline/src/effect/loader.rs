//! Effect asset loading
//!
//! Reads a WAV file once at startup and turns it into mono, normalized
//! chunks at the pipeline's sample rate.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use phone_agent_core::AudioChunk;
use rubato::{FftFixedIn, Resampler};

use crate::PipelineError;

/// Input block size for the FFT resampler
const RESAMPLE_CHUNK: usize = 1024;

/// Upper bound on flush calls after the last input block
const MAX_FLUSH_BLOCKS: usize = 8;

/// Load a WAV file as `chunk_ms` chunks at `target_rate`.
///
/// Multi-channel audio is averaged down to mono. Integer PCM is normalized
/// by its full-scale value. Never returns an empty chunk.
pub fn load_effect_chunks(
    path: &Path,
    target_rate: u32,
    chunk_ms: u32,
) -> Result<Vec<AudioChunk>, PipelineError> {
    if target_rate == 0 || chunk_ms == 0 {
        return Err(PipelineError::Audio(
            "target rate and chunk size must be positive".to_string(),
        ));
    }

    let mut reader = WavReader::open(path)
        .map_err(|e| PipelineError::Io(format!("{}: {}", path.display(), e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| PipelineError::Audio(e.to_string()))?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| PipelineError::Audio(e.to_string()))?
        }
    };

    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    let mono = if spec.sample_rate == target_rate {
        mono
    } else {
        tracing::debug!(
            from = spec.sample_rate,
            to = target_rate,
            "Resampling sound effect"
        );
        resample(&mono, spec.sample_rate, target_rate)?
    };

    Ok(AudioChunk::new(target_rate, mono).split(chunk_ms))
}

/// Resample mono audio between two rates.
///
/// The output is aligned with the input and holds exactly
/// `len * to / from` samples: the resampler's delay is dropped from the
/// front and its buffered tail is flushed at the end.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, PipelineError> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, RESAMPLE_CHUNK, 2, 1)
        .map_err(|e| PipelineError::Audio(format!("resampler setup failed: {}", e)))?;

    let expected = samples.len() * to as usize / from as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(delay + expected + RESAMPLE_CHUNK);
    let mut pos = 0;

    while samples.len() - pos >= resampler.input_frames_next() {
        let frames = resampler.input_frames_next();
        let block: [&[f32]; 1] = [&samples[pos..pos + frames]];
        let resampled = resampler
            .process(&block[..], None)
            .map_err(|e| PipelineError::Audio(format!("resampling failed: {}", e)))?;
        out.extend_from_slice(&resampled[0]);
        pos += frames;
    }

    if pos < samples.len() {
        let tail: [&[f32]; 1] = [&samples[pos..]];
        let resampled = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| PipelineError::Audio(format!("resampling failed: {}", e)))?;
        out.extend_from_slice(&resampled[0]);
    }

    let mut flushes = 0;
    while out.len() < delay + expected && flushes < MAX_FLUSH_BLOCKS {
        let resampled = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| PipelineError::Audio(format!("resampling failed: {}", e)))?;
        out.extend_from_slice(&resampled[0]);
        flushes += 1;
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}
