use crate::error::TransportError;
use crate::msc::MscEncoder;
use crate::translator::CueTrigger;
use crate::transport::OutputHandle;
use tracing::debug;

/// Encode a trigger and send it on the bound output.
///
/// Returns `Ok(false)` when no output is bound; the trigger is dropped.
pub fn dispatch<E: MscEncoder + ?Sized>(
    trigger: &CueTrigger,
    encoder: &E,
    output: Option<&mut dyn OutputHandle>,
) -> Result<bool, TransportError> {
    let Some(output) = output else {
        debug!("No output port bound, dropping cue {}", trigger.cue);
        return Ok(false);
    };

    let message = encoder.build_message(trigger);
    debug!("MSC Out: {:?} -> {:02X?}", trigger, message);
    output.send(&message)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msc::GoEncoder;
    use crate::transport::mock::MockTransport;
    use crate::transport::MidiTransport;

    fn trigger() -> CueTrigger {
        CueTrigger {
            device_id: "0".to_string(),
            command_format: "lighting.general",
            command: "go",
            cue: "12".to_string(),
            cue_list: "1".to_string(),
        }
    }

    #[test]
    fn test_unbound_output_is_noop() {
        assert_eq!(dispatch(&trigger(), &GoEncoder, None), Ok(false));
    }

    #[test]
    fn test_sends_encoded_frame() {
        let transport = MockTransport::new(&[], &["Console"]);
        let mut output = transport.open_output(0).unwrap();

        let sent = dispatch(&trigger(), &GoEncoder, Some(output.as_mut())).unwrap();
        assert!(sent);
        assert_eq!(transport.sent(), vec![GoEncoder.build_message(&trigger())]);
    }
}
