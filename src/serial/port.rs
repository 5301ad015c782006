//! Finding and opening the microcontroller's serial port.

use serialport::{ClearBuffer, SerialPort};

use std::time::Duration;

use crate::error::Error;

/// How long a read blocks before giving the I/O server a chance to write.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Returns the first device node matching the glob `pattern`, in lexical order.
pub fn discover(pattern: &str) -> Result<String, Error> {
    let paths = glob::glob(pattern)
        .map_err(|e| Error::DeviceUnavailable(format!("invalid device pattern {}: {}", pattern, e)))?;

    paths
        .filter_map(Result::ok)
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .ok_or_else(|| Error::DeviceUnavailable(format!("no device matches {}", pattern)))
}

/// Attempts to open the serial port at the provided path.
pub fn open_serial_port(path: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, Error> {
    let port = serialport::new(path, baud_rate)
        .timeout(READ_TIMEOUT)
        .open()
        .and_then(|p| {
            // Clear the serial port buffers to avoid reading garbage data
            p.clear(ClearBuffer::All).map(|_| p)
        })
        .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", path, e)))?;

    Ok(port)
}
