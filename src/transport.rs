use crate::error::TransportError;
use std::fmt;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "IN"),
            Direction::Output => write!(f, "OUT"),
        }
    }
}

/// Callback invoked by the transport for every inbound message.
/// Arguments are the transport timestamp (microseconds) and the raw bytes.
pub type InputConsumer = Box<dyn FnMut(u64, &[u8]) + Send + 'static>;

/// An open input port. Dropping or closing it stops delivery.
pub trait InputHandle {
    fn close(self: Box<Self>);
}

/// An open output port.
pub trait OutputHandle {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
    fn close(self: Box<Self>);
}

/// Native MIDI port enumeration and connection.
pub trait MidiTransport {
    /// Names of every port in one direction, taken from a single enumeration.
    /// A name the host cannot report is `None`; its slot still counts.
    fn port_names(&self, direction: Direction) -> Result<Vec<Option<String>>, TransportError>;

    /// Open an input port and register `consumer` on the new handle.
    /// A fresh handle never inherits a consumer from an earlier one.
    fn open_input(
        &self,
        index: usize,
        consumer: InputConsumer,
    ) -> Result<Box<dyn InputHandle>, TransportError>;

    fn open_output(&self, index: usize) -> Result<Box<dyn OutputHandle>, TransportError>;
}
