use crate::directory::PortDirectory;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

pub const DEVICE_ID_MAX: i32 = 111;
pub const CUELIST_MAX: u32 = 99_999;

/// Note-to-cue mapping scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    /// Note 0 only, cue = velocity (1-127)
    #[default]
    Simple,
    /// Notes 0-9, cue = note * 100 + velocity (1-999)
    Advanced,
}

impl TryFrom<u8> for Mode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Simple),
            1 => Ok(Mode::Advanced),
            other => Err(format!("unknown mode {other}")),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Simple => 0,
            Mode::Advanced => 1,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Simple => write!(f, "simple"),
            Mode::Advanced => write!(f, "advanced"),
        }
    }
}

/// Validated bridge settings. Field names match the persisted JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(rename = "inputPortID")]
    pub input_port_id: usize,
    #[serde(rename = "outputPortID")]
    pub output_port_id: usize,
    pub input_port_name: String,
    pub output_port_name: String,
    /// MIDI channel to listen on (1-16)
    pub channel: u8,
    pub mode: Mode,
    /// MSC device id (0-111). Negative means broadcast to all devices.
    #[serde(rename = "deviceID")]
    pub device_id: i32,
    pub cuelist: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_port_id: 0,
            output_port_id: 0,
            input_port_name: String::new(),
            output_port_name: String::new(),
            channel: 1,
            mode: Mode::Simple,
            device_id: 0,
            cuelist: 1,
        }
    }
}

/// Unvalidated values as submitted by the settings form.
///
/// Port names are not part of an update; they are derived from the
/// directory once the candidate passes validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub input_port_id: i64,
    pub output_port_id: i64,
    pub channel: i64,
    pub mode: i64,
    pub device_id: i64,
    pub cuelist: i64,
}

impl From<&Settings> for SettingsUpdate {
    fn from(settings: &Settings) -> Self {
        Self {
            input_port_id: settings.input_port_id as i64,
            output_port_id: settings.output_port_id as i64,
            channel: settings.channel.into(),
            mode: u8::from(settings.mode).into(),
            device_id: settings.device_id.into(),
            cuelist: settings.cuelist.into(),
        }
    }
}

impl SettingsUpdate {
    /// Check every range and build the settings value, or report the first
    /// violated field.
    pub fn validate(&self, directory: &PortDirectory) -> Result<Settings, ValidationError> {
        let input_port_id = usize::try_from(self.input_port_id)
            .map_err(|_| ValidationError::InvalidInputPort(self.input_port_id))?;
        let output_port_id = usize::try_from(self.output_port_id)
            .map_err(|_| ValidationError::InvalidOutputPort(self.output_port_id))?;

        if !(1..=16).contains(&self.channel) {
            return Err(ValidationError::ChannelOutOfRange(self.channel));
        }
        let mode = u8::try_from(self.mode)
            .ok()
            .and_then(|m| Mode::try_from(m).ok())
            .ok_or(ValidationError::InvalidMode(self.mode))?;
        if !(0..=i64::from(DEVICE_ID_MAX)).contains(&self.device_id) {
            return Err(ValidationError::DeviceIdOutOfRange(self.device_id));
        }
        if !(1..=i64::from(CUELIST_MAX)).contains(&self.cuelist) {
            return Err(ValidationError::CuelistOutOfRange(self.cuelist));
        }

        Ok(Settings {
            input_port_id,
            output_port_id,
            input_port_name: directory
                .input_name(input_port_id)
                .unwrap_or_default()
                .to_string(),
            output_port_name: directory
                .output_name(output_port_id)
                .unwrap_or_default()
                .to_string(),
            // Range checked above
            channel: self.channel as u8,
            mode,
            device_id: self.device_id as i32,
            cuelist: self.cuelist as u32,
        })
    }
}

/// Holds the current settings. Updates replace the whole value or nothing.
#[derive(Debug, Default)]
pub struct SettingsStore {
    current: Settings,
}

impl SettingsStore {
    pub fn current(&self) -> &Settings {
        &self.current
    }

    /// Validate a candidate and, if every check passes, make it current.
    pub fn validate_and_apply(
        &mut self,
        candidate: &SettingsUpdate,
        directory: &PortDirectory,
    ) -> Result<&Settings, ValidationError> {
        let validated = candidate.validate(directory)?;
        debug!("Settings updated: {:?}", validated);
        self.current = validated;
        Ok(&self.current)
    }

    /// Put back settings that were current before a failed update.
    pub fn restore(&mut self, previous: Settings) {
        debug!("Settings restored: {:?}", previous);
        self.current = previous;
    }

    /// Re-derive port IDs from the persisted names against a fresh directory.
    ///
    /// Ranges are not re-checked; they were valid when persisted.
    pub fn reconcile(&mut self, persisted: Settings, directory: &PortDirectory) -> &Settings {
        let input_port_id = directory.find_input(&persisted.input_port_name).unwrap_or(0);
        let output_port_id = directory
            .find_output(&persisted.output_port_name)
            .unwrap_or(0);

        info!(
            "Reconciled ports: input '{}' -> {}, output '{}' -> {}",
            persisted.input_port_name, input_port_id, persisted.output_port_name, output_port_id
        );

        self.current = Settings {
            input_port_id,
            output_port_id,
            ..persisted
        };
        &self.current
    }
}
