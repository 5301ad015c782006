//! A server for serial port communication.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serialport::SerialPort;
use tokio::sync::watch::Receiver;
use tracing::{debug, error};

use std::io::{self, Read, Write};

use super::{Client, Data};
use crate::error::Error;

/// A server that owns the serial port, writing data queued by a [`Client`] and forwarding data
/// read from the device back to it.
///
/// The server is the only writer of the port. Queued messages are written in order and a message
/// is always written completely before the next one is started.
pub struct Server {
    /// The serial port itself.
    port: Box<dyn SerialPort>,
    /// A buffer for reading data from the serial port.
    read_buf: Vec<u8>,
    /// A buffer for storing partially written data so that the write can be completed later.
    data_to_write: Option<Vec<u8>>,
    /// A receiver for data to be written to the serial port.
    rx: UnboundedReceiver<Data>,
    /// A sender for data received from the serial port.
    tx: UnboundedSender<Data>,
    /// A receiver for termination signals.
    terminate_rx: Receiver<()>,
}

impl Server {
    /// Returns a new `Server` for an opened `port` and the [`Client`] connected to it.
    ///
    /// `terminate_rx` is watched for a signal that the bridge is shutting down, in which case the
    /// server returns and the serial port is closed.
    pub fn new(port: Box<dyn SerialPort>, terminate_rx: Receiver<()>) -> (Self, Client) {
        // Open the serial port write channel
        let (write_tx, write_rx) = mpsc::unbounded();
        // Open the serial port read channel
        let (read_tx, read_rx) = mpsc::unbounded();

        let server = Server {
            port,
            read_buf: vec![0; 256],
            data_to_write: None,
            rx: write_rx,
            tx: read_tx,
            terminate_rx,
        };

        let client = Client::new(write_tx, read_rx);

        (server, client)
    }

    /// Runs the serial port communication server loop.
    ///
    /// A separate thread must be used for this as it blocks until termination. Returns `Err` if
    /// the device failed; the [`Client`] then observes the read channel closing.
    pub fn run(mut self) -> Result<(), Error> {
        loop {
            // Watch for termination signal
            if self.terminate_rx.has_changed().unwrap_or(true) {
                debug!("Serial I/O server terminating");
                return Ok(());
            }

            if let Err(e) = self.process_io() {
                error!("Serial device failed: {}", e);
                return Err(Error::SerialReadFatal(e.to_string()));
            }
        }
    }

    /// Processes serial port and [`Client`] I/O. Returns `Err` if the serial port could not be
    /// accessed.
    fn process_io(&mut self) -> io::Result<()> {
        // Write queued data to the port, finishing any partially written message first
        loop {
            if self.data_to_write.is_none() {
                self.data_to_write = match self.rx.try_next() {
                    Ok(Some(d)) => Some(d),
                    // Nothing queued, or every writer is gone
                    Ok(None) | Err(_) => None,
                };
            }

            let d = match self.data_to_write.take() {
                Some(d) => d,
                None => break,
            };

            match write(&mut self.port, &d) {
                Ok(None) => {}
                Ok(Some(remaining)) => {
                    // Let the device drain before writing the rest
                    self.data_to_write = Some(remaining);
                    break;
                }
                Err(e) => {
                    self.data_to_write = Some(d);
                    if is_temporary(&e) {
                        break;
                    }
                    return Err(e);
                }
            }
        }

        // Read data from port as it's received
        match self.port.read(&mut self.read_buf) {
            Ok(0) => {}
            // The client may already be gone during shutdown, in which case the data is dropped
            Ok(bytes) => {
                let _ = self.tx.unbounded_send(self.read_buf[..bytes].to_vec());
            }
            Err(e) if is_temporary(&e) => {}
            Err(e) => return Err(e),
        }

        Ok(())
    }
}

/// Returns whether `e` is an I/O condition that goes away on its own.
fn is_temporary(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// Writes `data` to `out`. Returns `Ok(None)` if all the data was successfully written, or
/// `Ok(Some)` with the remaining data otherwise.
fn write<F: Write>(mut out: F, data: &[u8]) -> Result<Option<Vec<u8>>, io::Error> {
    let bytes = out.write(data)?;

    if bytes < data.len() {
        Ok(Some(data[bytes..].to_vec()))
    } else {
        Ok(None)
    }
}
