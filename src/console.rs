use crate::directory::PortDirectory;
use crate::settings::{Settings, SettingsUpdate};
use std::io::BufRead;
use std::thread;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

pub const HELP: &str = "\
Commands:
  show                      current settings
  ports                     refresh and list MIDI ports
  set <field>=<value> ...   change settings (fields: input, output, channel,
                            mode, device, cuelist; mode accepts simple/advanced)
  help                      this text
  quit                      close ports and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Ports,
    Set(Vec<(Field, i64)>),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    InputPort,
    OutputPort,
    Channel,
    Mode,
    DeviceId,
    Cuelist,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("expected <field>=<value>, got '{0}'")]
    MissingValue(String),
    #[error("'{field}' must be a whole number, got '{value}'")]
    NotANumber { field: String, value: String },
    #[error("nothing to set")]
    Empty,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "input" | "in" | "inputportid" => Some(Field::InputPort),
            "output" | "out" | "outputportid" => Some(Field::OutputPort),
            "channel" | "ch" => Some(Field::Channel),
            "mode" => Some(Field::Mode),
            "device" | "deviceid" => Some(Field::DeviceId),
            "cuelist" | "list" => Some(Field::Cuelist),
            _ => None,
        }
    }
}

fn parse_value(field: Field, raw: &str) -> Option<i64> {
    if field == Field::Mode {
        match raw.to_ascii_lowercase().as_str() {
            "simple" => return Some(0),
            "advanced" => return Some(1),
            _ => {}
        }
    }
    raw.parse().ok()
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Result<Command, ParseError>> {
    let mut words = line.split_whitespace();
    let command = words.next()?;

    let parsed = match command.to_ascii_lowercase().as_str() {
        "show" => Ok(Command::Show),
        "ports" => Ok(Command::Ports),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "set" => parse_assignments(words).map(Command::Set),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    };
    Some(parsed)
}

fn parse_assignments<'a>(
    words: impl Iterator<Item = &'a str>,
) -> Result<Vec<(Field, i64)>, ParseError> {
    let assignments = words
        .map(|word| {
            let (name, raw) = word
                .split_once('=')
                .ok_or_else(|| ParseError::MissingValue(word.to_string()))?;
            let field =
                Field::parse(name).ok_or_else(|| ParseError::UnknownField(name.to_string()))?;
            let value = parse_value(field, raw).ok_or_else(|| ParseError::NotANumber {
                field: name.to_string(),
                value: raw.to_string(),
            })?;
            Ok((field, value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if assignments.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(assignments)
}

/// Forward stdin lines from a detached thread. The channel closes at EOF.
pub fn spawn_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Console input unavailable: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Console disabled: {}", e);
    }
    rx
}

/// Start from the current settings and override the given fields.
pub fn build_update(current: &Settings, assignments: &[(Field, i64)]) -> SettingsUpdate {
    let mut update = SettingsUpdate::from(current);
    for (field, value) in assignments {
        let slot = match field {
            Field::InputPort => &mut update.input_port_id,
            Field::OutputPort => &mut update.output_port_id,
            Field::Channel => &mut update.channel,
            Field::Mode => &mut update.mode,
            Field::DeviceId => &mut update.device_id,
            Field::Cuelist => &mut update.cuelist,
        };
        *slot = *value;
    }
    update
}

pub fn format_settings(settings: &Settings) -> String {
    format!(
        "input   {} '{}'\noutput  {} '{}'\nchannel {}\nmode    {}\ndevice  {}\ncuelist {}",
        settings.input_port_id,
        settings.input_port_name,
        settings.output_port_id,
        settings.output_port_name,
        settings.channel,
        settings.mode,
        settings.device_id,
        settings.cuelist
    )
}

pub fn format_ports(directory: &PortDirectory, settings: &Settings) -> String {
    let mut lines = vec!["Inputs:".to_string()];
    lines.extend(list(directory.inputs(), settings.input_port_id));
    lines.push("Outputs:".to_string());
    lines.extend(list(directory.outputs(), settings.output_port_id));
    lines.join("\n")
}

fn list(names: &[String], selected: usize) -> Vec<String> {
    if names.is_empty() {
        return vec!["  (none)".to_string()];
    }
    names
        .iter()
        .enumerate()
        .map(|(id, name)| {
            let marker = if id == selected { '*' } else { ' ' };
            format!(" {marker}{id:>3}  {name}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Mode;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("show"), Some(Ok(Command::Show)));
        assert_eq!(parse_line("PORTS"), Some(Ok(Command::Ports)));
        assert_eq!(parse_line("exit"), Some(Ok(Command::Quit)));
        assert_eq!(
            parse_line("bogus"),
            Some(Err(ParseError::UnknownCommand("bogus".to_string())))
        );
    }

    #[test]
    fn test_parse_set() {
        let parsed = parse_line("set channel=2 mode=advanced device=0 cuelist=1").unwrap();
        assert_eq!(
            parsed,
            Ok(Command::Set(vec![
                (Field::Channel, 2),
                (Field::Mode, 1),
                (Field::DeviceId, 0),
                (Field::Cuelist, 1),
            ]))
        );
    }

    #[test]
    fn test_parse_set_errors() {
        assert_eq!(parse_line("set").unwrap(), Err(ParseError::Empty));
        assert_eq!(
            parse_line("set channel").unwrap(),
            Err(ParseError::MissingValue("channel".to_string()))
        );
        assert_eq!(
            parse_line("set volume=3").unwrap(),
            Err(ParseError::UnknownField("volume".to_string()))
        );
        assert!(matches!(
            parse_line("set channel=two").unwrap(),
            Err(ParseError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_out_of_range_values_reach_validation() {
        // Range checks belong to the settings store, not the parser
        let parsed = parse_line("set channel=17 input=-1").unwrap().unwrap();
        let Command::Set(assignments) = parsed else {
            panic!("expected set");
        };
        let update = build_update(&Settings::default(), &assignments);
        assert_eq!(update.channel, 17);
        assert_eq!(update.input_port_id, -1);
    }

    #[test]
    fn test_build_update_keeps_unset_fields() {
        let current = Settings {
            channel: 5,
            mode: Mode::Advanced,
            device_id: 9,
            cuelist: 12,
            ..Settings::default()
        };
        let update = build_update(&current, &[(Field::Cuelist, 40)]);
        assert_eq!(update.channel, 5);
        assert_eq!(update.mode, 1);
        assert_eq!(update.device_id, 9);
        assert_eq!(update.cuelist, 40);
    }

    #[test]
    fn test_format_ports_marks_selection() {
        let directory = PortDirectory::from_names(
            vec!["Keys".to_string(), "Pads".to_string()],
            vec![],
        );
        let settings = Settings {
            input_port_id: 1,
            ..Settings::default()
        };
        let text = format_ports(&directory, &settings);
        assert!(text.contains(" *  1  Pads"));
        assert!(text.contains("  (none)"));
    }
}
