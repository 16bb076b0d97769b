mod loop_worker;
pub mod sources;

pub use sources::{AudioSource, FrameSource};

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    analysis::{AnalysisResult, SpeechMetrics},
    metrics::MetricsCollector,
    session::{SessionController, SessionSnapshot, SessionSummary},
};

use loop_worker::{frame_loop, voice_loop, LoopSettings};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Drives a [`SessionController`] from two independent tick loops.
///
/// Frame and voice cadences never share a timer, so a slow producer on one
/// side only delays its own ticks.
pub struct SessionRunner {
    controller: Arc<Mutex<SessionController>>,
    metrics: MetricsCollector,
    handles: Vec<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    heartbeat_every_ticks: u32,
}

impl SessionRunner {
    pub fn new(controller: SessionController) -> Self {
        let debug_mode = std::env::var("SPEAKWISE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            controller: Arc::new(Mutex::new(controller)),
            metrics: MetricsCollector::new(),
            handles: Vec::new(),
            cancel_token: None,
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
        }
    }

    pub fn controller(&self) -> Arc<Mutex<SessionController>> {
        Arc::clone(&self.controller)
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    pub fn is_running(&self) -> bool {
        self.cancel_token.is_some()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.controller.lock().await.snapshot()
    }

    /// Acquires devices, starts a session and spawns both tick loops.
    /// Returns the new session id.
    pub async fn start<F, A>(&mut self, frames: F, audio: A) -> Result<String>
    where
        F: FrameSource,
        A: AudioSource,
    {
        if self.cancel_token.is_some() {
            bail!("session runner already active");
        }

        let (session_id, config) = {
            let mut controller = self.controller.lock().await;
            controller
                .start_recording()
                .context("failed to start recording")?;
            let session_id = controller
                .start_session(Utc::now())
                .context("failed to start session")?;
            (session_id, controller.config().clone())
        };

        self.metrics.reset().await;
        let cancel_token = CancellationToken::new();

        let frame_handle = tokio::spawn(frame_loop(
            Arc::clone(&self.controller),
            frames,
            LoopSettings {
                interval: config.frame_interval(),
                heartbeat_every_ticks: self.heartbeat_every_ticks,
            },
            self.metrics.clone(),
            cancel_token.clone(),
        ));
        let voice_handle = tokio::spawn(voice_loop(
            Arc::clone(&self.controller),
            audio,
            LoopSettings {
                interval: config.voice_interval(),
                heartbeat_every_ticks: self.heartbeat_every_ticks,
            },
            self.metrics.clone(),
            cancel_token.clone(),
        ));

        self.handles = vec![frame_handle, voice_handle];
        self.cancel_token = Some(cancel_token);
        log_info!("runner started session {}", session_id);
        Ok(session_id)
    }

    /// Cancels both loops, waits for them, then freezes the session.
    /// Calling it again returns the same summary.
    pub async fn stop(&mut self) -> Result<SessionSummary> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        for handle in self.handles.drain(..) {
            handle.await.context("tick loop task failed to join")?;
        }

        let summary = self
            .controller
            .lock()
            .await
            .stop_session(Utc::now())
            .context("failed to stop session")?;
        Ok(summary)
    }

    /// Returns a finished session to idle so the runner can `start` again.
    pub async fn reset(&mut self) -> Result<()> {
        if self.cancel_token.is_some() {
            bail!("cannot reset while a session is running");
        }

        self.controller
            .lock()
            .await
            .reset()
            .context("failed to reset session")?;
        self.metrics.reset().await;
        Ok(())
    }

    pub async fn analyze(&mut self, speech: Option<SpeechMetrics>) -> Result<AnalysisResult> {
        if self.cancel_token.is_some() {
            self.stop().await?;
        }

        let result = self
            .controller
            .lock()
            .await
            .analyze(speech, Utc::now())
            .context("failed to analyze session")?;
        Ok(result)
    }
}
