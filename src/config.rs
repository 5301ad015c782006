//! Command line configuration.

use clap::Parser;
use url::Url;

use std::time::Duration;

use crate::error::Error;

/// The glob pattern used to find the microcontroller when no device is given.
pub const DEFAULT_DEVICE_PATTERN: &str = "/dev/ttyUSB*";
/// The baud rate the microcontroller firmware talks at.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// The remote service all polls and commands go to.
pub const DEFAULT_REMOTE_URL: &str = "http://sleepingbeauty.herokuapp.com";

/// Relays state between a serial-connected microcontroller and a remote HTTP service.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Config {
    /// Serial device to open. Discovered with `--device-pattern` if omitted.
    #[arg(long)]
    pub device: Option<String>,

    /// Glob pattern searched for the serial device; the first match is used.
    #[arg(long, default_value = DEFAULT_DEVICE_PATTERN)]
    pub device_pattern: String,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,

    /// Base URL of the remote service.
    #[arg(long, default_value = DEFAULT_REMOTE_URL)]
    pub remote_url: Url,

    /// Seconds to wait for the serial link to settle before sending anything.
    #[arg(long, default_value_t = 5)]
    pub startup_delay: u64,

    /// Seconds between rough movement polls.
    #[arg(long, default_value_t = 10)]
    pub rough_interval: u64,

    /// Seconds between really rough movement polls.
    #[arg(long, default_value_t = 1)]
    pub really_rough_interval: u64,

    /// Seconds between light state polls.
    #[arg(long, default_value_t = 1)]
    pub light_interval: u64,

    /// Timeout in seconds for each HTTP request. No timeout if omitted.
    #[arg(long)]
    pub http_timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config::parse_from(["arduino-bridge"])
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// Returns `Err` if the bridge cannot run with it, or a list of warnings for values that break
    /// the timing the microcontroller firmware was written against. The default rough movement
    /// interval is one of those: it is kept as is and reported.
    pub fn check(&self) -> Result<Vec<String>, Error> {
        let intervals = [
            ("rough interval", self.rough_interval),
            ("really rough interval", self.really_rough_interval),
            ("light interval", self.light_interval),
        ];

        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(Error::Config(format!("{} must be greater than zero", name)));
        }

        if self.baud_rate == 0 {
            return Err(Error::Config("baud rate must be greater than zero".to_string()));
        }

        if self.http_timeout == Some(0) {
            return Err(Error::Config("HTTP timeout must be greater than zero".to_string()));
        }

        let mut warnings = Vec::new();

        if self.startup_delay < 2 {
            warnings.push(format!(
                "startup delay of {}s is below 2s; the serial link may not be ready",
                self.startup_delay,
            ));
        }
        if self.rough_interval <= 10 {
            warnings.push(format!(
                "rough interval of {}s should be greater than 10s",
                self.rough_interval,
            ));
        }
        if self.really_rough_interval <= 1 {
            warnings.push(format!(
                "really rough interval of {}s should be greater than 1s",
                self.really_rough_interval,
            ));
        }
        if self.light_interval <= 1 {
            warnings.push(format!(
                "light interval of {}s should be greater than 1s",
                self.light_interval,
            ));
        }

        Ok(warnings)
    }

    /// Returns the timing constants of the bridge.
    pub fn timing(&self) -> Timing {
        Timing {
            startup_delay: Duration::from_secs(self.startup_delay),
            rough_interval: Duration::from_secs(self.rough_interval),
            really_rough_interval: Duration::from_secs(self.really_rough_interval),
            light_interval: Duration::from_secs(self.light_interval),
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout.map(Duration::from_secs)
    }
}

/// Delays and poll intervals used by the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Delay before the first message is sent.
    pub startup_delay: Duration,
    pub rough_interval: Duration,
    pub really_rough_interval: Duration,
    pub light_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Config::default().timing()
    }
}
