//! Phone agent runner
//!
//! Usage: `phone-agent <utterance text> [output.wav]`
//!
//! Runs one conversational turn over the offline backends and writes the
//! reply audio to a WAV file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use phone_agent_agent::{CallSession, KeywordToolReasoner, SessionDeps, TurnConfig};
use phone_agent_config::constants::audio;
use phone_agent_config::{LoggingSettings, Settings};
use phone_agent_core::AudioChunk;
use phone_agent_pipeline::effect::resample;
use phone_agent_pipeline::{BoundedEffectPlayer, ScriptedTranscriber, SilenceSynthesizer};
use phone_agent_tools::{InMemoryPropertyIndex, PropertySearchTool, ToolRegistry};

const DEFAULT_OUTPUT: &str = "turn.wav";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_tracing(&settings.logging);
    log_settings(&settings);

    let mut args = std::env::args().skip(1);
    let Some(utterance) = args.next() else {
        bail!("usage: phone-agent <utterance text> [output.wav]");
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting phone agent"
    );

    let deps = build_deps(&settings, &utterance)?;
    let session = CallSession::new(&deps)?;

    // The scripted transcriber ignores the audio; send a short silent utterance
    let inbound = AudioChunk::silence(audio::SAMPLE_RATE, audio::SAMPLE_RATE as usize);
    let outcome = session.handle_utterance_collect(inbound).await;

    write_wav(&output, &outcome.chunks, audio::SAMPLE_RATE)?;
    tracing::info!(
        path = %output.display(),
        chunks = outcome.chunks.len(),
        samples = outcome.total_samples(),
        "Wrote turn audio"
    );

    session.end("turn complete");

    if let Some(err) = outcome.error {
        bail!("turn failed in {} stage: {}", err.stage(), err);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn log_settings(settings: &Settings) {
    tracing::info!(
        sound_effect_seconds = settings.agent.sound_effect_seconds,
        port_timeout_ms = ?settings.agent.port_timeout_ms,
        filler_failure = ?settings.agent.filler_failure,
        effect_asset = ?settings.effect.path,
        property_data = ?settings.search.data_path,
        log_level = %settings.logging.level,
        "Settings loaded"
    );
}

fn build_deps(settings: &Settings, utterance: &str) -> anyhow::Result<SessionDeps> {
    let effect = match &settings.effect.path {
        Some(path) => BoundedEffectPlayer::load(
            path,
            settings.effect.target_rate,
            settings.effect.chunk_ms,
        )
        .unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Sound effect unavailable, playing none");
            BoundedEffectPlayer::empty()
        }),
        None => {
            tracing::warn!("No sound effect configured");
            BoundedEffectPlayer::empty()
        }
    };

    let index = match &settings.search.data_path {
        Some(path) => InMemoryPropertyIndex::load_json(path)
            .with_context(|| format!("Failed to load properties from {}", path.display()))?,
        None => {
            tracing::warn!("No property data configured, searches will find nothing");
            InMemoryPropertyIndex::default()
        }
    };

    let search = PropertySearchTool::new(Arc::new(index))
        .with_limits(settings.search.default_limit, settings.search.max_limit);
    let tools = ToolRegistry::new().with_tool(Arc::new(search));

    Ok(SessionDeps {
        transcriber: Arc::new(ScriptedTranscriber::new(utterance)),
        reasoner: Arc::new(KeywordToolReasoner::new(tools)),
        synthesizer: Arc::new(SilenceSynthesizer::new(audio::SAMPLE_RATE)),
        effect,
        config: TurnConfig::from(settings),
    })
}

/// Write chunks as 16-bit mono PCM at `sample_rate`, resampling as needed
fn write_wav(path: &Path, chunks: &[AudioChunk], sample_rate: u32) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for chunk in chunks {
        let pcm = if chunk.sample_rate() == sample_rate {
            chunk.to_i16()
        } else {
            let samples = resample(chunk.samples(), chunk.sample_rate(), sample_rate)?;
            AudioChunk::new(sample_rate, samples).to_i16()
        };
        for sample in pcm {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}
