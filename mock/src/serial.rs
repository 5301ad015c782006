//! A mock serial port implementation.

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// How long a read waits when no data is available, like a real port's read timeout.
const READ_TIMEOUT: Duration = Duration::from_millis(1);

/// A serial port standing in for the microcontroller. Data written by the bridge is recorded, and
/// data queued with [`send`][Self::send] is returned to the bridge's reads. This type is a handle
/// that can be cloned to control the port from multiple locations.
#[derive(Clone)]
pub struct TestPort {
    /// Data sent by the device, waiting to be read.
    input: Arc<Mutex<VecDeque<u8>>>,
    /// Data written to the device.
    output: Arc<Mutex<Vec<u8>>>,
    /// Whether the port has an error. Simulates a physical disconnect if `true`.
    has_error: Arc<AtomicBool>,
    /// The most bytes accepted by a single write, or 0 for no limit. Simulates a slow device.
    max_write: Arc<AtomicUsize>,
}

impl TestPort {
    /// Returns a new `TestPort` that has no errors and accepts whole writes.
    pub fn new() -> serialport::Result<Self> {
        Ok(Self {
            input: Arc::new(Mutex::new(VecDeque::new())),
            output: Arc::new(Mutex::new(Vec::new())),
            has_error: Arc::new(false.into()),
            max_write: Arc::new(0.into()),
        })
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    pub fn set_has_error(&self, has_error: bool) {
        self.has_error.store(has_error, Ordering::SeqCst);
    }

    /// Limits each write to `max_write` bytes, or removes the limit if 0.
    pub fn set_max_write(&self, max_write: usize) {
        self.max_write.store(max_write, Ordering::SeqCst);
    }

    /// Queues `data` as if the device had sent it.
    pub fn send(&self, data: &[u8]) {
        self.input.lock().unwrap().extend(data);
    }

    /// Queues `line` and a line terminator as if the device had sent it.
    pub fn send_line(&self, line: &str) {
        self.send(format!("{}\r\n", line).as_bytes());
    }

    /// Returns everything written to the device so far.
    pub fn output(&self) -> Vec<u8> {
        self.output.lock().unwrap().clone()
    }

    /// Returns everything written to the device so far as text.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output()).into_owned()
    }

    // Returns `Err` if the `has_error` flag is true, or `Ok` otherwise.
    pub fn try_access(&self) -> io::Result<()> {
        if self.has_error() {
            Err(io::ErrorKind::BrokenPipe.into())
        } else {
            Ok(())
        }
    }

    fn input(&self) -> MutexGuard<VecDeque<u8>> {
        self.input.lock().unwrap()
    }
}

impl Write for TestPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_access()?;

        let bytes = match self.max_write.load(Ordering::SeqCst) {
            0 => buf.len(),
            max => buf.len().min(max),
        };
        self.output.lock().unwrap().extend_from_slice(&buf[..bytes]);

        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.try_access()
    }
}

impl Read for TestPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.try_access()?;

        let bytes = {
            let mut input = self.input();
            let bytes = buf.len().min(input.len());
            for (b, c) in buf.iter_mut().zip(input.drain(..bytes)) {
                *b = c;
            }
            bytes
        };

        if bytes == 0 {
            // Behave like a real port whose read timed out
            thread::sleep(READ_TIMEOUT);
            return Err(io::ErrorKind::TimedOut.into());
        }

        Ok(bytes)
    }
}

impl SerialPort for TestPort {
    fn name(&self) -> Option<String> {
        None
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        self.try_access().map(|_| 9600).map_err(Into::into)
    }

    fn data_bits(&self) -> serialport::Result<DataBits> {
        self.try_access().map(|_| DataBits::Eight).map_err(Into::into)
    }

    fn flow_control(&self) -> serialport::Result<FlowControl> {
        self.try_access().map(|_| FlowControl::None).map_err(Into::into)
    }

    fn parity(&self) -> serialport::Result<Parity> {
        self.try_access().map(|_| Parity::None).map_err(Into::into)
    }

    fn timeout(&self) -> Duration {
        READ_TIMEOUT
    }

    fn set_baud_rate(&mut self, _baud_rate: u32) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn stop_bits(&self) -> serialport::Result<StopBits> {
        self.try_access().map(|_| StopBits::One).map_err(Into::into)
    }

    fn set_data_bits(&mut self, _data_bits: DataBits) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_flow_control(&mut self, _flow_control: FlowControl) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_parity(&mut self, _parity: Parity) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_stop_bits(&mut self, _stop_bits: StopBits) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_timeout(&mut self, _timeout: Duration) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn write_request_to_send(&mut self, _level: bool) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn write_data_terminal_ready(&mut self, _level: bool) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        self.try_access().map(|_| self.input().len() as u32).map_err(Into::into)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        self.try_access().map(|_| 0).map_err(Into::into)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn clear(&self, _buffer_to_clear: ClearBuffer) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn SerialPort>> {
        Ok(Box::new(self.clone()))
    }

    fn set_break(&self) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn clear_break(&self) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_new() {
        let port = TestPort::new().unwrap();

        assert!(!port.has_error());
        assert!(port.output().is_empty());
    }

    #[test]
    fn test_port_write() {
        let mut port = TestPort::new().unwrap();

        assert_eq!(3, port.write(&[1, 2, 3]).unwrap());
        port.write(&[4, 5, 6]).unwrap();
        assert_eq!(vec![1, 2, 3, 4, 5, 6], port.output());

        // Written data is not read back
        let mut buf = [0; 4];
        assert!(port.read(&mut buf).is_err());
    }

    #[test]
    fn test_port_partial_write() {
        let mut port = TestPort::new().unwrap();

        port.set_max_write(2);
        assert_eq!(2, port.write(b"Data21").unwrap());
        assert_eq!("Da", port.output_string());
    }

    #[test]
    fn test_port_read() {
        let mut port = TestPort::new().unwrap();

        port.send_line("DATA 1");

        let mut buf = [0; 4];
        assert_eq!(4, port.read(&mut buf).unwrap());
        assert_eq!(b"DATA", &buf);
        assert_eq!(4, port.read(&mut buf).unwrap());
        assert_eq!(b" 1\r\n", &buf);

        // No more data; the read times out
        let err = port.read(&mut buf).unwrap_err();
        assert_eq!(io::ErrorKind::TimedOut, err.kind());
    }

    #[test]
    fn test_port_error() {
        let mut port = TestPort::new().unwrap();

        port.set_has_error(true);

        assert!(port.try_access().is_err());
        assert!(port.write(&[]).is_err());
        assert!(port.read(&mut []).is_err());
    }

    #[test]
    fn test_port_clone() {
        let port = TestPort::new().unwrap();
        let mut port_clone = port.clone();

        port_clone.write(&[1, 2, 3]).unwrap();
        port_clone.set_has_error(true);

        // Changes to a clone of the port affect the original copy
        assert_eq!(vec![1, 2, 3], port.output());
        assert!(port.has_error());
    }
}
