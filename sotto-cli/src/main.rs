//! Sotto command-line host.
//!
//! Wires `sotto-core` to the stub providers and drives the engine over
//! files:
//!
//! ```text
//! sotto transcribe <file.wav>     decode, gate, transcribe, print
//! sotto silence <file.wav>        print the silence verdict
//! sotto speak <text> <out.wav>    synthesize text into a WAV file
//! ```
//!
//! Swap the stub providers for real adapters to talk to cloud services.

mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use sotto_core::providers::stub::{StubPromptService, StubSpeechToText, StubTextToSpeech};
use sotto_core::{wav, Providers, SottoEngine};
use tracing::info;

use settings::{default_settings_path, load_settings};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sotto=info".parse().unwrap()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("sotto: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let settings_path = default_settings_path();
    let settings = load_settings(&settings_path);
    info!(settings_path = %settings_path.display(), "settings loaded");

    let providers = Providers {
        speech_to_text: Arc::new(StubSpeechToText::new()),
        text_to_speech: Arc::new(StubTextToSpeech::new()),
        prompts: Some(Arc::new(StubPromptService::new())),
    };
    let engine = SottoEngine::new(settings.engine_config(), providers);

    match args.first().map(String::as_str) {
        Some("transcribe") => {
            let path = args.get(1).context("usage: sotto transcribe <file.wav>")?;
            transcribe(&engine, path)
        }
        Some("silence") => {
            let path = args.get(1).context("usage: sotto silence <file.wav>")?;
            silence(&engine, path)
        }
        Some("speak") => {
            let text = args.get(1).context("usage: sotto speak <text> <out.wav>")?;
            let out = args.get(2).context("usage: sotto speak <text> <out.wav>")?;
            speak(&engine, text, out)
        }
        _ => {
            eprintln!("usage: sotto <transcribe|silence|speak> …");
            bail!("no command given");
        }
    }
}

fn transcribe(engine: &SottoEngine, path: &str) -> anyhow::Result<()> {
    let bytes = wav::read_file(path).with_context(|| format!("reading {path}"))?;
    let recording = engine
        .ingest_wav(&bytes, path)
        .with_context(|| format!("decoding {path}"))?;

    let pcm = recording.pcm();
    info!(
        sample_rate = pcm.sample_rate,
        bits = pcm.bits_per_sample,
        channels = pcm.channels,
        seconds = format_args!("{:.2}", pcm.duration_secs()),
        "decoded"
    );

    if engine.check_silence(pcm)? {
        println!("(buffer is silent — nothing to transcribe)");
        return Ok(());
    }

    let recording = engine.transcribe_recording(recording.id())?;
    println!("{}", recording.transcript().unwrap_or_default());
    if let Some(reply) = recording.reply() {
        println!("reply: {reply}");
    }
    Ok(())
}

fn silence(engine: &SottoEngine, path: &str) -> anyhow::Result<()> {
    let bytes = wav::read_file(path).with_context(|| format!("reading {path}"))?;
    let pcm = wav::decode(&bytes)?;
    let verdict = engine.check_silence(&pcm)?;
    println!("{}", if verdict { "silent" } else { "sound" });
    Ok(())
}

fn speak(engine: &SottoEngine, text: &str, out: &str) -> anyhow::Result<()> {
    let audio = engine.synthesize(text)?;
    std::fs::write(out, &audio).with_context(|| format!("writing {out}"))?;
    info!(bytes = audio.len(), out, "audio written");
    Ok(())
}
