use crate::settings::{Mode, Settings};
use serde::Serialize;

/// Note-on status for channel 1 is 0x90 (144); the logical channel is
/// `status - 143`, so 0x90..=0x9F map to 1..=16 and every other status
/// falls outside that range.
const CHANNEL_OFFSET: i16 = 143;

pub const COMMAND_FORMAT_LIGHTING_GENERAL: &str = "lighting.general";
pub const COMMAND_GO: &str = "go";
pub const BROADCAST_DEVICE: &str = "all";

/// A three-byte short message as delivered by the input port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub status: u8,
    pub note: u8,
    pub velocity: u8,
}

impl MidiEvent {
    /// Decode a raw message. Anything shorter than three bytes is ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        match *data {
            [status, note, velocity, ..] => Some(Self {
                status,
                note,
                velocity,
            }),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            status: 0x90 | (channel.saturating_sub(1) & 0x0F),
            note,
            velocity,
        }
    }

    /// Logical channel (1-16 for note-on messages)
    pub fn channel(&self) -> i16 {
        i16::from(self.status) - CHANNEL_OFFSET
    }
}

/// Descriptor handed to the MSC encoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CueTrigger {
    pub device_id: String,
    pub command_format: &'static str,
    pub command: &'static str,
    pub cue: String,
    pub cue_list: String,
}

/// Translate one event into at most one cue trigger.
pub fn translate(event: &MidiEvent, settings: &Settings) -> Option<CueTrigger> {
    if event.channel() != i16::from(settings.channel) {
        return None;
    }

    let cue = cue_number(event, settings.mode)?;
    // A mapping that lands on cue 0 never fires
    if cue == 0 {
        return None;
    }

    Some(CueTrigger {
        device_id: device_field(settings.device_id),
        command_format: COMMAND_FORMAT_LIGHTING_GENERAL,
        command: COMMAND_GO,
        cue: cue.to_string(),
        cue_list: settings.cuelist.to_string(),
    })
}

fn cue_number(event: &MidiEvent, mode: Mode) -> Option<u16> {
    match mode {
        Mode::Simple => (event.note == 0).then_some(u16::from(event.velocity)),
        Mode::Advanced => (event.note <= 9 && event.velocity <= 99)
            .then(|| u16::from(event.velocity) + u16::from(event.note) * 100),
    }
}

fn device_field(device_id: i32) -> String {
    if device_id < 0 {
        BROADCAST_DEVICE.to_string()
    } else {
        device_id.to_string()
    }
}
