use crate::translator::{BROADCAST_DEVICE, CueTrigger};
use tracing::warn;

const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;
const UNIVERSAL_REAL_TIME: u8 = 0x7F;
const MSC_SUB_ID: u8 = 0x02;
const ALL_CALL: u8 = 0x7F;
const FIELD_DELIMITER: u8 = 0x00;

/// Turns a cue trigger into the bytes sent on the output port:
/// `F0 7F <device> 02 <command format> <command> <data> F7`
pub trait MscEncoder {
    fn build_message(&self, trigger: &CueTrigger) -> Vec<u8>;
}

/// Encoder for the lighting.general / go command family
#[derive(Debug, Default, Clone, Copy)]
pub struct GoEncoder;

fn command_format_byte(format: &str) -> Option<u8> {
    match format {
        "lighting" | "lighting.general" => Some(0x01),
        _ => None,
    }
}

fn command_byte(command: &str) -> Option<u8> {
    match command {
        "go" => Some(0x01),
        _ => None,
    }
}

fn device_byte(device_id: &str) -> u8 {
    if device_id == BROADCAST_DEVICE {
        return ALL_CALL;
    }
    match device_id.parse::<u8>() {
        Ok(id) if id < ALL_CALL => id,
        _ => {
            warn!("Device ID '{}' is not addressable, using all-call", device_id);
            ALL_CALL
        }
    }
}

/// Cue numbers travel as ASCII digits (and '.')
fn push_ascii_number(frame: &mut Vec<u8>, number: &str) {
    frame.extend(
        number
            .bytes()
            .filter(|b| b.is_ascii_digit() || *b == b'.'),
    );
}

impl MscEncoder for GoEncoder {
    fn build_message(&self, trigger: &CueTrigger) -> Vec<u8> {
        let format = command_format_byte(trigger.command_format).unwrap_or(0x01);
        let command = command_byte(trigger.command).unwrap_or(0x01);

        let mut frame = vec![
            SYSEX_START,
            UNIVERSAL_REAL_TIME,
            device_byte(&trigger.device_id),
            MSC_SUB_ID,
            format,
            command,
        ];

        if !trigger.cue.is_empty() {
            push_ascii_number(&mut frame, &trigger.cue);
            if !trigger.cue_list.is_empty() {
                frame.push(FIELD_DELIMITER);
                push_ascii_number(&mut frame, &trigger.cue_list);
            }
        }

        frame.push(SYSEX_END);
        frame
    }
}
