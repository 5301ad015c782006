//! Relaying of light switch commands from the microcontroller to the remote service.

use tracing::debug;

use std::sync::Arc;

use crate::clock;
use crate::error::Error;
use crate::guard::LightSwitchGuard;
use crate::message::Command;
use crate::remote::Remote;
use crate::serial::LineReader;

/// Endpoint that records light switch changes.
pub const LIGHT_POWER_PATH: &str = "/light_power";

/// Reads commands from the microcontroller and posts them to the remote service.
pub struct CommandRelay {
    reader: LineReader,
    remote: Arc<dyn Remote>,
    guard: LightSwitchGuard,
}

impl CommandRelay {
    pub fn new(reader: LineReader, remote: Arc<dyn Remote>, guard: LightSwitchGuard) -> Self {
        CommandRelay {
            reader,
            remote,
            guard,
        }
    }

    /// Relays commands until the serial device fails. Lines that are not commands are ignored.
    pub async fn run(mut self) -> Result<(), Error> {
        loop {
            let line = self.reader.read_line().await?;
            debug!("Received from device: {:?}", line);

            if let Some(command) = Command::parse(&line) {
                self.switch_lights(command).await;
            }
        }
    }

    /// Posts a light switch change. The light state poll is blocked for the duration of the
    /// request, and failures are dropped.
    pub async fn switch_lights(&self, command: Command) {
        let _blocked = self.guard.block();

        let form = [
            ("light_power[on]".to_string(), command.power().to_string()),
            ("light_power[time]".to_string(), clock::epoch_millis().to_string()),
        ];

        if let Err(e) = self.remote.post(LIGHT_POWER_PATH, &form).await {
            debug!("Failed to switch lights {:?}: {}", command, e);
        }
    }
}
