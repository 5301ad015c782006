//! The serial wire protocol spoken with the microcontroller.
//!
//! Outgoing messages are a tag, the payload, and for most tags a trailing `a` that the firmware
//! uses as an end marker. The light state message has no end marker.
//!
//! Incoming lines are commands from the light switch and are matched by substring.

use std::fmt;

/// Marker in an incoming line asking to turn the lights off.
const LIGHT_OFF_MARKER: &str = "DATA 0";
/// Marker in an incoming line asking to turn the lights on.
const LIGHT_ON_MARKER: &str = "DATA 1";

/// The kind of an outgoing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    /// The current time, sent once at startup.
    Time,
    /// The time of the last rough movement.
    RoughMovement,
    /// The current light state.
    LightState,
    /// The time of the last really rough movement.
    ReallyRoughMovement,
}

impl Tag {
    /// Returns the prefix identifying this tag on the wire.
    pub fn prefix(self) -> &'static str {
        match self {
            Tag::Time => "Time",
            Tag::RoughMovement => "Data1",
            Tag::LightState => "Data2",
            Tag::ReallyRoughMovement => "Data3",
        }
    }

    /// Returns whether messages with this tag end with the `a` marker.
    pub fn has_end_marker(self) -> bool {
        !matches!(self, Tag::LightState)
    }
}

/// A message to be written to the microcontroller. Its `Display` output is the exact wire text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialMessage {
    tag: Tag,
    payload: String,
}

impl SerialMessage {
    pub fn new(tag: Tag, payload: impl Into<String>) -> Self {
        SerialMessage {
            tag,
            payload: payload.into(),
        }
    }

    /// Returns the startup message carrying `epoch_secs`.
    pub fn time(epoch_secs: u64) -> Self {
        SerialMessage::new(Tag::Time, epoch_secs.to_string())
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Returns the bytes to write to the serial port.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for SerialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag.prefix(), self.payload)?;

        if self.tag.has_end_marker() {
            write!(f, "a")?;
        }

        Ok(())
    }
}

/// A command sent by the microcontroller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    LightOff,
    LightOn,
}

impl Command {
    /// Classifies an incoming line. Returns `None` for lines that are not commands.
    ///
    /// The light off marker wins if a line somehow carries both.
    pub fn parse(line: &str) -> Option<Command> {
        if line.contains(LIGHT_OFF_MARKER) {
            Some(Command::LightOff)
        } else if line.contains(LIGHT_ON_MARKER) {
            Some(Command::LightOn)
        } else {
            None
        }
    }

    /// Returns the value the remote service expects for `light_power[on]`.
    pub fn power(self) -> u8 {
        match self {
            Command::LightOff => 0,
            Command::LightOn => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        assert_eq!("Data11364412345a", SerialMessage::new(Tag::RoughMovement, "1364412345").to_string());
        assert_eq!("Data31364412345a", SerialMessage::new(Tag::ReallyRoughMovement, "1364412345").to_string());
        // No end marker for the light state
        assert_eq!("Data21", SerialMessage::new(Tag::LightState, "1").to_string());
        assert_eq!("Time1364412345a", SerialMessage::time(1364412345).to_string());
    }

    #[test]
    fn test_message_payload_is_raw() {
        let message = SerialMessage::new(Tag::LightState, "0\n");

        assert_eq!(b"Data20\n".to_vec(), message.to_bytes());
        assert_eq!("0\n", message.payload());
        assert_eq!(Tag::LightState, message.tag());
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Some(Command::LightOff), Command::parse("DATA 0"));
        assert_eq!(Some(Command::LightOn), Command::parse("DATA 1"));
        assert_eq!(Some(Command::LightOn), Command::parse("> DATA 1 <"));
        assert_eq!(Some(Command::LightOff), Command::parse("DATA 0 DATA 1"));

        assert_eq!(None, Command::parse(""));
        assert_eq!(None, Command::parse("DATA"));
        assert_eq!(None, Command::parse("data 1"));
        assert_eq!(None, Command::parse("DATA 2"));
    }

    #[test]
    fn test_command_power() {
        assert_eq!(0, Command::LightOff.power());
        assert_eq!(1, Command::LightOn.power());
    }
}
