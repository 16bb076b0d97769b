pub mod analysis;
pub mod config;
pub mod error;
pub mod gaze;
pub mod metrics;
pub mod runner;
pub mod scoring;
pub mod segments;
pub mod session;
pub mod signal;
pub mod simulate;
pub mod voice;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::mpsc;

use analysis::SpeechMetrics;
use config::CoachConfig;
use runner::SessionRunner;
use session::{NoopDevices, SessionController, SessionEvent};
use simulate::{SyntheticGaze, SyntheticVoice};

const DEFAULT_CONFIG_PATH: &str = "speakwise.json";
const DEFAULT_DEMO_SECS: u64 = 10;
/// Words per minute and clarity of the canned transcript the demo analyzes with.
const DEMO_WPM: f64 = 135.0;
const DEMO_CLARITY: f64 = 82.0;

/// Runs one synthetic practice session and prints its analysis as JSON.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("SpeakWise starting up...");

    let config_path = std::env::var("SPEAKWISE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = CoachConfig::load(&config_path)?;

    let demo_secs = match std::env::var("SPEAKWISE_DEMO_SECS") {
        Ok(value) => value
            .parse::<u64>()
            .with_context(|| format!("SPEAKWISE_DEMO_SECS is not a number: {value}"))?,
        Err(_) => DEFAULT_DEMO_SECS,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_demo(config, demo_secs))
}

async fn run_demo(config: CoachConfig, demo_secs: u64) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let event_logger = tokio::spawn(async move {
        let mut voice_events = 0u64;
        let mut frame_events = 0u64;
        while let Some(event) = events_rx.recv().await {
            match event {
                SessionEvent::Voice { .. } => voice_events += 1,
                SessionEvent::Frame { .. } => frame_events += 1,
                SessionEvent::StateChanged { state, session_id } => {
                    info!("session {:?} is now {}", session_id, state.as_str());
                }
                SessionEvent::SegmentClosed { segment, .. } => {
                    info!(
                        "segment {} closed: {:.1}s eye contact, score {:.0}",
                        segment.index,
                        segment.eye_contact_secs,
                        segment.score.unwrap_or_default()
                    );
                }
                SessionEvent::Error { message } => warn!("session error: {message}"),
                SessionEvent::Stopped { .. } | SessionEvent::Analyzed { .. } => {}
            }
        }
        (voice_events, frame_events)
    });

    let controller = SessionController::new(config, Box::new(NoopDevices::default()))
        .with_events(events_tx);
    let mut runner = SessionRunner::new(controller);

    let session_id = runner
        .start(SyntheticGaze::new(), SyntheticVoice::new(160.0))
        .await?;
    info!("recording synthetic session {session_id} for {demo_secs}s");

    tokio::time::sleep(std::time::Duration::from_secs(demo_secs)).await;

    let summary = runner.stop().await?;
    let speech = SpeechMetrics {
        word_count: (DEMO_WPM * summary.duration_secs / 60.0).round() as u32,
        duration_secs: summary.duration_secs,
        speech_rate_wpm: DEMO_WPM,
        clarity_score: DEMO_CLARITY,
    };
    let result = runner.analyze(Some(speech)).await?;

    let metrics = runner.metrics().get_snapshot().await;
    info!(
        "ticks: frame {}/{} missed, voice {}/{} missed, mean {:.0}us/{:.0}us, cpu {:.1}%, mem {:.1}MB",
        metrics.frame_ticks.missed,
        metrics.frame_ticks.total(),
        metrics.voice_ticks.missed,
        metrics.voice_ticks.total(),
        metrics.mean_frame_us,
        metrics.mean_voice_us,
        metrics.system.cpu_percent,
        metrics.system.memory_mb
    );

    // dropping the runner closes the event channel
    drop(runner);
    let (voice_events, frame_events) = event_logger
        .await
        .context("event logger task failed to join")?;
    info!("delivered {voice_events} voice and {frame_events} frame events");

    let json = serde_json::to_string_pretty(&result).context("failed to serialize analysis")?;
    println!("{json}");
    Ok(())
}
