use crate::error::TransportError;
use crate::transport::{Direction, MidiTransport};
use tracing::{debug, warn};

/// Snapshot of the available ports. The position of a name is its port ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortDirectory {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl PortDirectory {
    #[cfg(test)]
    pub fn from_names(inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self { inputs, outputs }
    }

    /// Enumerate both directions from the transport.
    pub fn refresh<T: MidiTransport + ?Sized>(transport: &T) -> Result<Self, TransportError> {
        let directory = Self {
            inputs: Self::enumerate(transport, Direction::Input)?,
            outputs: Self::enumerate(transport, Direction::Output)?,
        };
        debug!(
            "Port directory refreshed: {} inputs, {} outputs",
            directory.inputs.len(),
            directory.outputs.len()
        );
        Ok(directory)
    }

    fn enumerate<T: MidiTransport + ?Sized>(
        transport: &T,
        direction: Direction,
    ) -> Result<Vec<String>, TransportError> {
        let names = transport
            .port_names(direction)?
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                // Keep the slot so later ports keep their IDs
                name.unwrap_or_else(|| {
                    warn!("Could not read {} port {} name", direction, index);
                    String::new()
                })
            })
            .collect();
        Ok(names)
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn input_name(&self, id: usize) -> Option<&str> {
        self.inputs.get(id).map(String::as_str)
    }

    pub fn output_name(&self, id: usize) -> Option<&str> {
        self.outputs.get(id).map(String::as_str)
    }

    /// First exact match wins.
    pub fn find_input(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|n| n == name)
    }

    pub fn find_output(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_refresh_replaces_snapshot() {
        let transport = MockTransport::new(&["A", "B"], &["Out"]);
        let first = PortDirectory::refresh(&transport).unwrap();
        assert_eq!(first.inputs(), ["A", "B"]);
        assert_eq!(first.output_name(0), Some("Out"));

        transport.set_ports(&["B"], &[]);
        let second = PortDirectory::refresh(&transport).unwrap();
        assert_eq!(second.find_input("B"), Some(0));
        assert_eq!(second.find_input("A"), None);
        assert!(second.outputs().is_empty());
    }

    #[test]
    fn test_unreadable_name_keeps_its_slot() {
        let transport = MockTransport::new(&["A", "B", "C"], &[]);
        transport.hide_name(Direction::Input, 1);

        let directory = PortDirectory::refresh(&transport).unwrap();
        assert_eq!(directory.inputs(), ["A", "", "C"]);
        assert_eq!(directory.find_input("C"), Some(2));
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let directory = PortDirectory::from_names(
            vec!["Dup".to_string(), "Other".to_string(), "Dup".to_string()],
            vec![],
        );
        assert_eq!(directory.find_input("Dup"), Some(0));
        assert_eq!(directory.input_name(5), None);
    }
}
