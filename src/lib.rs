//! A bridge between a serial-connected microcontroller and a remote HTTP service.
//!
//! The bridge polls the service for movement events and the light state and writes them to the
//! microcontroller, and posts light switch commands read from the microcontroller back to the
//! service.

pub mod bridge;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod message;
pub mod poll;
pub mod relay;
pub mod remote;
pub mod serial;

use futures::{FutureExt, select};
use serialport::SerialPort;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use std::sync::Arc;
use std::thread;

use crate::bridge::Bridge;
use crate::config::{Config, Timing};
use crate::error::Error;
use crate::remote::{HttpRemote, Remote};
use crate::serial::Server;

/// Launches the bridge described by `config`.
///
/// Returns `Err` if the serial device cannot be found or opened, or when it fails while running.
/// Returns `Ok` after a ctrl-c.
pub async fn launch(config: Config) -> Result<(), Error> {
    for warning in config.check()? {
        warn!("{}", warning);
    }

    let path = match config.device {
        Some(ref p) => p.clone(),
        None => serial::discover(&config.device_pattern)?,
    };
    info!("Device port: {}", path);
    info!("Remote service: {}", config.remote_url);

    let port = serial::open_serial_port(&path, config.baud_rate)?;
    let remote = HttpRemote::new(config.remote_url.clone(), config.http_timeout())?;

    launch_with_port(config.timing(), port, Arc::new(remote)).await
}

/// Like [`launch`], but with an already opened serial port and a custom remote service.
pub async fn launch_with_port(
    timing: Timing,
    port: Box<dyn SerialPort>,
    remote: Arc<dyn Remote>,
) -> Result<(), Error> {
    let (terminate_tx, terminate_rx) = watch::channel(());

    // Create a serial I/O server
    let (serial_server, serial_client) = Server::new(port, terminate_rx);
    let server_handle = thread::spawn(|| serial_server.run());

    let bridge = Bridge::new(timing, serial_client, remote).run().fuse();
    let ctrlc = signal::ctrl_c().fuse();
    futures::pin_mut!(bridge, ctrlc);

    let result = select! {
        res = bridge => res,
        res = ctrlc => {
            if let Err(e) = res {
                error!("Failed to wait for ctrl-c signal: {}", e);
            }
            Ok(())
        },
    };

    // Stop the serial I/O server if it is still running
    let _ = terminate_tx.send(());
    let server_result = server_handle
        .join()
        .unwrap_or_else(|_| Err(Error::SerialReadFatal("serial I/O server panicked".to_string())));

    info!("Shutting down");

    // The server knows why the device failed, so its error is preferred
    match (result, server_result) {
        (Err(_), Err(e)) => Err(e),
        (result, _) => result,
    }
}
