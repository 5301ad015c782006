//! Startup sequencing of the bridge's tasks.

use tokio::task::JoinSet;
use tokio::time;
use tracing::{info, warn};

use std::sync::Arc;

use crate::clock;
use crate::config::Timing;
use crate::error::Error;
use crate::guard::LightSwitchGuard;
use crate::message::SerialMessage;
use crate::poll::{self, PollTask};
use crate::relay::CommandRelay;
use crate::remote::Remote;
use crate::serial::{Client, LineReader, SerialWriter};

/// The polls and the command relay sharing one serial connection and one remote service.
pub struct Bridge {
    timing: Timing,
    writer: SerialWriter,
    reader: LineReader,
    remote: Arc<dyn Remote>,
    guard: LightSwitchGuard,
}

impl Bridge {
    pub fn new(timing: Timing, client: Client, remote: Arc<dyn Remote>) -> Self {
        let (writer, reader) = client.split();

        Bridge {
            timing,
            writer,
            reader,
            remote,
            guard: LightSwitchGuard::new(),
        }
    }

    /// Returns the guard shared by the command relay and the light state poll.
    pub fn guard(&self) -> &LightSwitchGuard {
        &self.guard
    }

    /// Runs the bridge: waits for the serial link to settle, sends the current time, starts the
    /// polls, and relays commands until the serial device fails.
    ///
    /// The polls are stopped when this returns or when the returned future is dropped.
    pub async fn run(self) -> Result<(), Error> {
        time::sleep(self.timing.startup_delay).await;

        if let Err(e) = self.writer.write(&SerialMessage::time(clock::epoch_secs())) {
            warn!("Failed to send startup time: {}", e);
        }

        // Dropping the set aborts every poll
        let mut polls = JoinSet::new();
        for config in poll::default_tasks(&self.timing, &self.guard) {
            info!("Starting {} poll", config.name);
            let task = PollTask::new(config, self.remote.clone(), self.writer.clone());
            polls.spawn(task.run());
        }

        let relay = CommandRelay::new(self.reader, self.remote, self.guard);
        let result = relay.run().await;

        polls.shutdown().await;

        result
    }
}
