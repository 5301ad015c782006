//! A client for serial port communication.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use tracing::info;

use super::Data;
use super::lines::LineBuffer;
use crate::error::Error;
use crate::message::SerialMessage;

/// A client of the serial port connection that allows sending data to be written and receiving
/// data back.
///
/// A single client is provided when the I/O server is created. Split it to hand the writing half
/// to every task that sends messages.
pub struct Client {
    /// A sender for data to be written to the serial port.
    pub tx: UnboundedSender<Data>,
    /// A receiver for data read from the serial port.
    pub rx: UnboundedReceiver<Data>,
}

impl Client {
    pub fn new(tx: UnboundedSender<Data>, rx: UnboundedReceiver<Data>) -> Self {
        Client {
            tx,
            rx,
        }
    }

    /// Splits the client into its writing and reading halves.
    pub fn split(self) -> (SerialWriter, LineReader) {
        (SerialWriter::new(self.tx), LineReader::new(self.rx))
    }
}

/// The writing half of a [`Client`]. Cheap to clone.
///
/// Each message is queued as one unit and the I/O server writes queued messages one at a time, so
/// concurrent writers never interleave bytes within a message.
#[derive(Clone)]
pub struct SerialWriter {
    tx: UnboundedSender<Data>,
}

impl SerialWriter {
    pub fn new(tx: UnboundedSender<Data>) -> Self {
        SerialWriter {
            tx,
        }
    }

    /// Queues `message` to be written to the serial port.
    ///
    /// Returns `Err` if the I/O server has stopped.
    pub fn write(&self, message: &SerialMessage) -> Result<(), Error> {
        info!("{}", message);

        self.tx
            .unbounded_send(message.to_bytes())
            .map_err(|_| Error::SerialClosed)
    }
}

/// The reading half of a [`Client`].
pub struct LineReader {
    rx: UnboundedReceiver<Data>,
    lines: LineBuffer,
}

impl LineReader {
    pub fn new(rx: UnboundedReceiver<Data>) -> Self {
        LineReader {
            rx,
            lines: LineBuffer::new(),
        }
    }

    /// Waits for the next complete line from the device.
    ///
    /// Returns `Err` once the I/O server has stopped, which only happens if the device failed or
    /// the bridge is shutting down.
    pub async fn read_line(&mut self) -> Result<String, Error> {
        loop {
            if let Some(line) = self.lines.next_line() {
                return Ok(line);
            }

            match self.rx.next().await {
                Some(data) => self.lines.extend(&data),
                None => {
                    return Err(Error::SerialReadFatal("serial I/O server stopped".to_string()));
                }
            }
        }
    }
}
