//! Serial port communication and handling.

mod client;
mod lines;
mod port;
mod server;

pub use client::{Client, LineReader, SerialWriter};
pub use lines::LineBuffer;
pub use port::{discover, open_serial_port};
pub use server::Server;

/// The message type used in channels related to the serial port.
pub type Data = Vec<u8>;
