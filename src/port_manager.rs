use crate::error::{PortError, TransportError};
use crate::settings::Settings;
use crate::translator::MidiEvent;
use crate::transport::{InputHandle, MidiTransport, OutputHandle};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Binding state of one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Unbound,
    Bound(usize),
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortState::Unbound => write!(f, "unbound"),
            PortState::Bound(id) => write!(f, "port {id}"),
        }
    }
}

/// Outcome of rebinding both directions. Each direction fails independently.
#[derive(Debug)]
pub struct BindReport {
    pub input: Result<(), PortError>,
    pub output: Result<(), PortError>,
}

impl BindReport {
    pub fn errors(self) -> impl Iterator<Item = PortError> {
        [self.input.err(), self.output.err()].into_iter().flatten()
    }
}

/// Owns the open input and output ports
pub struct PortManager<T: MidiTransport> {
    transport: T,
    events: UnboundedSender<MidiEvent>,
    input: Option<(usize, Box<dyn InputHandle>)>,
    output: Option<(usize, Box<dyn OutputHandle>)>,
}

impl<T: MidiTransport> PortManager<T> {
    /// `events` receives every decoded message from whichever input is bound.
    pub fn new(transport: T, events: UnboundedSender<MidiEvent>) -> Self {
        Self {
            transport,
            events,
            input: None,
            output: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn input_state(&self) -> PortState {
        self.input
            .as_ref()
            .map_or(PortState::Unbound, |(id, _)| PortState::Bound(*id))
    }

    pub fn output_state(&self) -> PortState {
        self.output
            .as_ref()
            .map_or(PortState::Unbound, |(id, _)| PortState::Bound(*id))
    }

    /// Close and reopen both directions on the ports named by `settings`.
    pub fn apply_settings(&mut self, settings: &Settings) -> BindReport {
        BindReport {
            input: self.bind_input(settings.input_port_id, &settings.input_port_name),
            output: self.bind_output(settings.output_port_id, &settings.output_port_name),
        }
    }

    pub fn bind_input(&mut self, port_id: usize, port_name: &str) -> Result<(), PortError> {
        debug!("Changing port: IN={}", port_id);
        self.close_input();

        // Every new handle needs its own consumer
        let events = self.events.clone();
        let consumer = Box::new(move |_timestamp: u64, data: &[u8]| {
            if let Some(event) = MidiEvent::from_bytes(data) {
                // Receiver gone means we are shutting down
                let _ = events.send(event);
            }
        });

        match self.transport.open_input(port_id, consumer) {
            Ok(handle) => {
                info!("Input port {} '{}' opened", port_id, port_name);
                self.input = Some((port_id, handle));
                Ok(())
            }
            Err(cause) => Err(Self::open_failed(port_name, cause, |port, cause| {
                PortError::InputOpen { port, cause }
            })),
        }
    }

    pub fn bind_output(&mut self, port_id: usize, port_name: &str) -> Result<(), PortError> {
        debug!("Changing port: OUT={}", port_id);
        self.close_output();

        match self.transport.open_output(port_id) {
            Ok(handle) => {
                info!("Output port {} '{}' opened", port_id, port_name);
                self.output = Some((port_id, handle));
                Ok(())
            }
            Err(cause) => Err(Self::open_failed(port_name, cause, |port, cause| {
                PortError::OutputOpen { port, cause }
            })),
        }
    }

    fn open_failed(
        port_name: &str,
        cause: TransportError,
        make: impl FnOnce(String, TransportError) -> PortError,
    ) -> PortError {
        let port = if port_name.is_empty() {
            "(no port)".to_string()
        } else {
            port_name.to_string()
        };
        let err = make(port, cause);
        warn!("{} ({})", err, err_cause(&err));
        err
    }

    /// The bound output, if any.
    pub fn output_mut(&mut self) -> Option<&mut dyn OutputHandle> {
        match self.output.as_mut() {
            Some((_, handle)) => Some(handle.as_mut()),
            None => None,
        }
    }

    fn close_input(&mut self) {
        if let Some((id, handle)) = self.input.take() {
            debug!("Closing input port {}", id);
            handle.close();
        }
    }

    fn close_output(&mut self) {
        if let Some((id, handle)) = self.output.take() {
            debug!("Closing output port {}", id);
            handle.close();
        }
    }

    /// Force both directions to unbound.
    pub fn close_all(&mut self) {
        self.close_input();
        self.close_output();
    }
}

impl<T: MidiTransport> Drop for PortManager<T> {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn err_cause(err: &PortError) -> &TransportError {
    match err {
        PortError::InputOpen { cause, .. } | PortError::OutputOpen { cause, .. } => cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Direction;
    use crate::transport::mock::{Call, MockTransport};
    use tokio::sync::mpsc;

    fn manager(
        transport: &MockTransport,
    ) -> (PortManager<MockTransport>, mpsc::UnboundedReceiver<MidiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PortManager::new(transport.clone(), tx), rx)
    }

    fn settings(input: usize, output: usize) -> Settings {
        Settings {
            input_port_id: input,
            output_port_id: output,
            input_port_name: "Keys".to_string(),
            output_port_name: "Console".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_apply_binds_both_directions() {
        let transport = MockTransport::new(&["Keys"], &["Console"]);
        let (mut ports, _rx) = manager(&transport);

        let report = ports.apply_settings(&settings(0, 0));
        assert!(report.input.is_ok());
        assert!(report.output.is_ok());
        assert_eq!(ports.input_state(), PortState::Bound(0));
        assert_eq!(ports.output_state(), PortState::Bound(0));
    }

    #[test]
    fn test_rebinding_closes_before_opening() {
        let transport = MockTransport::new(&["Keys"], &["Console"]);
        let (mut ports, _rx) = manager(&transport);

        ports.bind_input(0, "Keys").unwrap();
        transport.clear_calls();
        ports.bind_input(0, "Keys").unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                Call::Close(Direction::Input, 1),
                Call::Open(Direction::Input, 0, 2),
            ]
        );
    }

    #[test]
    fn test_apply_twice_is_one_close_one_open_per_direction() {
        let transport = MockTransport::new(&["Keys"], &["Console"]);
        let (mut ports, _rx) = manager(&transport);

        ports.apply_settings(&settings(0, 0));
        transport.clear_calls();
        ports.apply_settings(&settings(0, 0));

        let calls = transport.calls();
        assert_eq!(
            calls,
            vec![
                Call::Close(Direction::Input, 1),
                Call::Open(Direction::Input, 0, 3),
                Call::Close(Direction::Output, 2),
                Call::Open(Direction::Output, 0, 4),
            ]
        );
    }

    #[test]
    fn test_open_failure_leaves_direction_unbound() {
        let transport = MockTransport::new(&["Keys"], &["Console"]);
        transport.fail_open(Direction::Output, 0);
        let (mut ports, _rx) = manager(&transport);

        let report = ports.apply_settings(&settings(0, 0));
        assert!(report.input.is_ok());
        let err = report.output.unwrap_err();
        assert_eq!(err.code(), 302);
        assert!(err.to_string().contains("\"Console\""));
        assert_eq!(ports.output_state(), PortState::Unbound);
        assert!(ports.output_mut().is_none());
    }

    #[test]
    fn test_failure_after_bound_drops_old_handle() {
        let transport = MockTransport::new(&["Keys"], &["Console"]);
        let (mut ports, _rx) = manager(&transport);
        ports.bind_input(0, "Keys").unwrap();

        let err = ports.bind_input(4, "").unwrap_err();
        assert_eq!(err.code(), 301);
        assert!(err.to_string().contains("(no port)"));
        assert_eq!(ports.input_state(), PortState::Unbound);
        assert!(transport.calls().contains(&Call::Close(Direction::Input, 1)));
    }

    #[test]
    fn test_reopened_input_delivers_to_fresh_consumer() {
        let transport = MockTransport::new(&["Keys", "Pads"], &[]);
        let (mut ports, mut rx) = manager(&transport);

        ports.bind_input(0, "Keys").unwrap();
        assert!(transport.inject(&[0x90, 0, 1]));
        ports.bind_input(1, "Pads").unwrap();
        assert!(transport.inject(&[0x90, 0, 2]));

        assert_eq!(rx.try_recv().unwrap().velocity, 1);
        assert_eq!(rx.try_recv().unwrap().velocity, 2);
    }

    #[test]
    fn test_close_all_and_drop() {
        let transport = MockTransport::new(&["Keys"], &["Console"]);
        let (mut ports, _rx) = manager(&transport);
        ports.apply_settings(&settings(0, 0));

        ports.close_all();
        assert_eq!(ports.input_state(), PortState::Unbound);
        assert_eq!(ports.output_state(), PortState::Unbound);
        // Closing an unbound direction is a no-op
        ports.close_all();
        assert!(!transport.inject(&[0x90, 0, 1]));

        transport.clear_calls();
        ports.bind_output(0, "Console").unwrap();
        drop(ports);
        assert_eq!(
            transport.calls().last(),
            Some(&Call::Close(Direction::Output, 3))
        );
    }
}
