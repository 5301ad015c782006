//! Periodic polls of the remote service whose results are forwarded to the microcontroller.

use tokio::time;
use tracing::{debug, trace, warn};

use std::sync::Arc;
use std::time::Duration;

use crate::config::Timing;
use crate::guard::LightSwitchGuard;
use crate::message::{SerialMessage, Tag};
use crate::remote::Remote;
use crate::serial::SerialWriter;

/// Endpoint holding the time of the last rough movement.
pub const ROUGH_MOVEMENT_PATH: &str = "/rough_movements/last_time.txt";
/// Endpoint holding the current light state.
pub const LIGHT_STATE_PATH: &str = "/light_power/last.txt";

/// What a poll should query and how to forward the result.
#[derive(Clone, Debug)]
pub struct PollTaskConfig {
    /// Name used in logs.
    pub name: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Time between the end of one poll and the start of the next.
    pub interval: Duration,
    pub tag: Tag,
    /// If set, polls are skipped while the guard is blocked.
    pub guard: Option<LightSwitchGuard>,
}

/// Returns the polls the bridge runs: rough movements, really rough movements, and the light
/// state. Only the light state poll observes `guard`.
pub fn default_tasks(timing: &Timing, guard: &LightSwitchGuard) -> Vec<PollTaskConfig> {
    vec![
        PollTaskConfig {
            name: "rough-movement",
            path: ROUGH_MOVEMENT_PATH.to_string(),
            query: Vec::new(),
            interval: timing.rough_interval,
            tag: Tag::RoughMovement,
            guard: None,
        },
        PollTaskConfig {
            name: "really-rough-movement",
            path: ROUGH_MOVEMENT_PATH.to_string(),
            query: vec![("really_rough".to_string(), "1".to_string())],
            interval: timing.really_rough_interval,
            tag: Tag::ReallyRoughMovement,
            guard: None,
        },
        PollTaskConfig {
            name: "light-state",
            path: LIGHT_STATE_PATH.to_string(),
            query: Vec::new(),
            interval: timing.light_interval,
            tag: Tag::LightState,
            guard: Some(guard.clone()),
        },
    ]
}

/// The result of a single poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The guard was blocked, so the remote service was not queried.
    Skipped,
    /// The response was forwarded to the microcontroller.
    Forwarded,
    /// The request failed or returned something other than 200; nothing was forwarded.
    Ignored,
}

/// A poll that runs forever on its own interval.
pub struct PollTask {
    config: PollTaskConfig,
    remote: Arc<dyn Remote>,
    writer: SerialWriter,
}

impl PollTask {
    pub fn new(config: PollTaskConfig, remote: Arc<dyn Remote>, writer: SerialWriter) -> Self {
        PollTask {
            config,
            remote,
            writer,
        }
    }

    pub fn config(&self) -> &PollTaskConfig {
        &self.config
    }

    /// Polls once, forwarding the response body if the remote service answered with 200.
    ///
    /// Failures are logged and otherwise dropped; the next poll is the retry.
    pub async fn poll_once(&self) -> PollOutcome {
        let name = self.config.name;

        if let Some(ref guard) = self.config.guard {
            if guard.is_blocked() {
                trace!("{}: blocked, skipping poll", name);
                return PollOutcome::Skipped;
            }
        }

        let response = match self.remote.get(&self.config.path, &self.config.query).await {
            Ok(r) => r,
            Err(e) => {
                debug!("{}: poll failed: {}", name, e);
                return PollOutcome::Ignored;
            }
        };

        if response.status != 200 {
            debug!("{}: ignoring status {}", name, response.status);
            return PollOutcome::Ignored;
        }

        let message = SerialMessage::new(self.config.tag, response.body);
        match self.writer.write(&message) {
            Ok(()) => PollOutcome::Forwarded,
            Err(e) => {
                warn!("{}: {}", name, e);
                PollOutcome::Ignored
            }
        }
    }

    /// Polls immediately and then again `interval` after each poll finishes. Never returns.
    pub async fn run(self) {
        debug!("{}: polling every {:?}", self.config.name, self.config.interval);

        loop {
            self.poll_once().await;
            time::sleep(self.config.interval).await;
        }
    }
}
