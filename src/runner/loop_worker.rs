use std::sync::Arc;

use chrono::Utc;
use tokio::{
    sync::Mutex,
    time::{Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    metrics::{MetricsCollector, TickKind, TickMetrics, TickOutcome},
    session::{SessionController, SessionState},
};

use super::sources::{AudioSource, FrameSource};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub(crate) struct LoopSettings {
    pub interval: Duration,
    pub heartbeat_every_ticks: u32,
}

pub(crate) async fn frame_loop<S: FrameSource>(
    controller: Arc<Mutex<SessionController>>,
    mut source: S,
    settings: LoopSettings,
    metrics: MetricsCollector,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let timestamp = Utc::now();
                let started = Instant::now();

                let outcome = match source.poll_frame(timestamp) {
                    None => TickOutcome::Missed,
                    Some(frame) => {
                        let mut guard = controller.lock().await;
                        match guard.ingest_frame(&frame) {
                            Ok(Some(_)) => TickOutcome::Processed,
                            Ok(None) if guard.state() == SessionState::Active => TickOutcome::Skipped,
                            Ok(None) => break,
                            Err(err) => {
                                log_error!("frame loop stopping: {err}");
                                break;
                            }
                        }
                    }
                };

                if outcome == TickOutcome::Missed {
                    log_warn!("frame source missed tick at {}", timestamp);
                }
                metrics
                    .record_tick(TickMetrics {
                        timestamp,
                        kind: TickKind::Frame,
                        outcome,
                        processing_us: started.elapsed().as_micros() as u64,
                    })
                    .await;

                ticks = ticks.wrapping_add(1);
                if ticks % settings.heartbeat_every_ticks == 0 {
                    let snapshot = controller.lock().await.snapshot();
                    log_info!(
                        "heartbeat: {} frame ticks, {:.1}% eye contact, segment {:?}",
                        snapshot.frame_ticks,
                        snapshot.eye_contact_percentage,
                        snapshot.open_segment
                    );
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("frame loop shutting down");
                break;
            }
        }
    }
}

pub(crate) async fn voice_loop<S: AudioSource>(
    controller: Arc<Mutex<SessionController>>,
    mut source: S,
    settings: LoopSettings,
    metrics: MetricsCollector,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let timestamp = Utc::now();
                let started = Instant::now();

                let outcome = match source.poll_buffer(timestamp) {
                    None => TickOutcome::Missed,
                    Some(buffer) => {
                        let mut guard = controller.lock().await;
                        match guard.ingest_audio(&buffer) {
                            Ok(Some(_)) => TickOutcome::Processed,
                            Ok(None) if guard.state() == SessionState::Active => TickOutcome::Skipped,
                            Ok(None) => break,
                            Err(err) => {
                                log_error!("voice loop stopping: {err}");
                                break;
                            }
                        }
                    }
                };

                if outcome == TickOutcome::Missed {
                    log_warn!("audio source missed tick at {}", timestamp);
                }
                metrics
                    .record_tick(TickMetrics {
                        timestamp,
                        kind: TickKind::Voice,
                        outcome,
                        processing_us: started.elapsed().as_micros() as u64,
                    })
                    .await;

                ticks = ticks.wrapping_add(1);
                if ticks % settings.heartbeat_every_ticks == 0 {
                    let snapshot = controller.lock().await.snapshot();
                    log_info!("heartbeat: {} voice ticks", snapshot.voice_ticks);
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("voice loop shutting down");
                break;
            }
        }
    }
}
