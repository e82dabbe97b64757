//! Cosmetic progress indicator for long uploads
//!
//! The backend gives no progress feedback, so the indicator advances on a
//! timer by a random step and stops short of 100. It only reaches 100 when
//! the owning flow calls [`ProgressGuard::finish`] after a successful call.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Timing, step size, ceiling and status messages of one ticker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressProfile {
    pub interval: Duration,
    pub min_step: f64,
    pub max_step: f64,
    /// Highest value the ticker itself will show
    pub cap: f64,
    /// Percent between message changes
    pub message_step: f64,
    pub messages: &'static [&'static str],
}

impl ProgressProfile {
    pub const UPLOAD: Self = Self {
        interval: Duration::from_millis(800),
        min_step: 1.0,
        max_step: 4.0,
        cap: 95.0,
        message_step: 15.0,
        messages: &[
            "Preparing upload...",
            "Uploading file... This may take a few seconds to a few minutes",
            "Processing file...",
            "Validating content...",
            "Generating embeddings...",
            "Finalizing upload...",
        ],
    };

    pub const REPLACE: Self = Self {
        interval: Duration::from_millis(1000),
        min_step: 0.5,
        max_step: 2.5,
        cap: 90.0,
        message_step: 10.0,
        messages: &[
            "Preparing replacement...",
            "Deleting existing file...",
            "Uploading new file... This may take a few seconds to a few minutes",
            "Processing file...",
            "Validating content...",
            "Generating embeddings...",
            "Finalizing replacement...",
        ],
    };

}

/// One progress reading
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub message: String,
}

impl Progress {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent,
            message: message.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// Value and message position shared by a ticker and its guard
#[derive(Debug)]
struct Stage {
    raw: f64,
    message_index: usize,
    message: &'static str,
}

impl Stage {
    fn lock(stage: &Mutex<Stage>) -> MutexGuard<'_, Stage> {
        stage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Starts tickers
pub struct ProgressTicker;

impl ProgressTicker {
    /// Reset `tx` to zero and start ticking. Ticking stops when the returned
    /// guard is dropped.
    pub fn start(tx: Arc<watch::Sender<Progress>>, profile: ProgressProfile) -> ProgressGuard {
        tx.send_replace(Progress::new(0, profile.messages[0]));
        let stage = Arc::new(Mutex::new(Stage {
            raw: 0.0,
            message_index: 0,
            message: profile.messages[0],
        }));

        let ticker_tx = tx.clone();
        let ticker_stage = stage.clone();
        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut interval = tokio::time::interval(profile.interval);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let (percent, message) = {
                    let mut stage = Stage::lock(&ticker_stage);
                    stage.raw += rng.gen_range(profile.min_step..profile.max_step);
                    if stage.raw > stage.message_index as f64 * profile.message_step
                        && stage.message_index < profile.messages.len() - 1
                    {
                        stage.message_index += 1;
                        stage.message = profile.messages[stage.message_index];
                    }
                    stage.raw = stage.raw.min(profile.cap);
                    (stage.raw.round() as u8, stage.message)
                };
                ticker_tx.send_if_modified(|p| advance(p, percent, message));
            }
        });

        ProgressGuard {
            handle,
            tx,
            stage,
            profile,
        }
    }
}

/// Never lowers the value and never touches a completed reading
fn advance(current: &mut Progress, percent: u8, message: &str) -> bool {
    if current.is_complete() {
        return false;
    }
    let percent = percent.max(current.percent);
    if percent == current.percent && current.message == message {
        return false;
    }
    current.percent = percent;
    current.message = message.to_string();
    true
}

/// Owns a running ticker; aborts it on drop
pub struct ProgressGuard {
    handle: JoinHandle<()>,
    tx: Arc<watch::Sender<Progress>>,
    stage: Arc<Mutex<Stage>>,
    profile: ProgressProfile,
}

impl ProgressGuard {
    /// Jump to a stage. The value never decreases and stays below the cap.
    /// A message from the profile also moves the ticker's message position
    /// forward, so later ticks never show an earlier message.
    pub fn stage(&self, percent: u8, message: &'static str) {
        let (percent, message) = {
            let mut stage = Stage::lock(&self.stage);
            stage.raw = stage.raw.max(f64::from(percent).min(self.profile.cap));
            match self.profile.messages.iter().position(|m| *m == message) {
                Some(index) if index < stage.message_index => {}
                Some(index) => {
                    stage.message_index = index;
                    stage.message = message;
                }
                None => stage.message = message,
            }
            (stage.raw.round() as u8, stage.message)
        };
        self.tx.send_if_modified(|p| advance(p, percent, message));
    }

    /// Stop ticking and show 100
    pub fn finish(self, message: &str) {
        self.handle.abort();
        self.tx.send_replace(Progress::new(100, message));
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
