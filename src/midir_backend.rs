use crate::error::TransportError;
use crate::transport::{Direction, InputConsumer, InputHandle, MidiTransport, OutputHandle};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::debug;

pub struct MidirTransport {
    client_name: String,
}

impl MidirTransport {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
        }
    }

    fn input_client(&self) -> Result<MidiInput, TransportError> {
        let mut midi_in = MidiInput::new(&format!("{}-in", self.client_name))
            .map_err(|e| TransportError::Init(e.to_string()))?;
        // Only short channel messages are of interest
        midi_in.ignore(Ignore::All);
        Ok(midi_in)
    }

    fn output_client(&self) -> Result<MidiOutput, TransportError> {
        MidiOutput::new(&format!("{}-out", self.client_name))
            .map_err(|e| TransportError::Init(e.to_string()))
    }
}

impl MidiTransport for MidirTransport {
    fn port_names(&self, direction: Direction) -> Result<Vec<Option<String>>, TransportError> {
        let names = match direction {
            Direction::Input => {
                let midi_in = self.input_client()?;
                midi_in
                    .ports()
                    .iter()
                    .map(|port| readable(midi_in.port_name(port)))
                    .collect()
            }
            Direction::Output => {
                let midi_out = self.output_client()?;
                midi_out
                    .ports()
                    .iter()
                    .map(|port| readable(midi_out.port_name(port)))
                    .collect()
            }
        };
        Ok(names)
    }

    fn open_input(
        &self,
        index: usize,
        mut consumer: InputConsumer,
    ) -> Result<Box<dyn InputHandle>, TransportError> {
        let midi_in = self.input_client()?;
        let ports = midi_in.ports();
        let port = ports.get(index).ok_or(TransportError::NoSuchPort(index))?;

        let connection = midi_in
            .connect(
                port,
                &format!("{}-input", self.client_name),
                move |timestamp, data, _| {
                    debug!("MIDI In: {:02X?}", data);
                    consumer(timestamp, data);
                },
                (),
            )
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Box::new(MidirInput { connection }))
    }

    fn open_output(&self, index: usize) -> Result<Box<dyn OutputHandle>, TransportError> {
        let midi_out = self.output_client()?;
        let ports = midi_out.ports();
        let port = ports.get(index).ok_or(TransportError::NoSuchPort(index))?;

        let connection = midi_out
            .connect(port, &format!("{}-output", self.client_name))
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Box::new(MidirOutput { connection }))
    }
}

fn readable(name: Result<String, midir::PortInfoError>) -> Option<String> {
    name.map_err(|e| debug!("Unreadable port name: {}", e)).ok()
}

struct MidirInput {
    connection: MidiInputConnection<()>,
}

impl InputHandle for MidirInput {
    fn close(self: Box<Self>) {
        let _ = self.connection.close();
    }
}

struct MidirOutput {
    connection: MidiOutputConnection,
}

impl OutputHandle for MidirOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.connection
            .send(bytes)
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn close(self: Box<Self>) {
        let _ = self.connection.close();
    }
}
