mod types;

pub use types::{MetricsSnapshot, SystemMetrics, TickCounts, TickKind, TickMetrics, TickOutcome};

use std::collections::VecDeque;
use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_TICKS: usize = 20;

/// Per-tick timing and outcome counters shared by both runner loops.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_ticks: VecDeque<TickMetrics>,
    frame_ticks: TickCounts,
    voice_ticks: TickCounts,
    frame_us_total: u64,
    voice_us_total: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // CPU usage is a delta between refreshes, so take a baseline now
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_ticks: VecDeque::with_capacity(MAX_RECENT_TICKS),
                frame_ticks: TickCounts::default(),
                voice_ticks: TickCounts::default(),
                frame_us_total: 0,
                voice_us_total: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_tick(&self, metrics: TickMetrics) {
        let mut state = self.inner.lock().await;

        let processed = metrics.outcome == TickOutcome::Processed;
        match metrics.kind {
            TickKind::Frame => {
                state.frame_ticks.bump(metrics.outcome);
                if processed {
                    state.frame_us_total += metrics.processing_us;
                }
            }
            TickKind::Voice => {
                state.voice_ticks.bump(metrics.outcome);
                if processed {
                    state.voice_us_total += metrics.processing_us;
                }
            }
        }

        if state.recent_ticks.len() == MAX_RECENT_TICKS {
            state.recent_ticks.pop_front();
        }
        state.recent_ticks.push_back(metrics);
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system = state
            .system
            .process(pid)
            .map(|process| SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            })
            .unwrap_or_default();

        MetricsSnapshot {
            system,
            recent_ticks: state.recent_ticks.iter().cloned().collect(),
            frame_ticks: state.frame_ticks,
            voice_ticks: state.voice_ticks,
            mean_frame_us: mean(state.frame_us_total, state.frame_ticks.processed),
            mean_voice_us: mean(state.voice_us_total, state.voice_ticks.processed),
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_ticks.clear();
        state.frame_ticks = TickCounts::default();
        state.voice_ticks = TickCounts::default();
        state.frame_us_total = 0;
        state.voice_us_total = 0;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn mean(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
