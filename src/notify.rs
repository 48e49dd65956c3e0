use crate::error::{PortError, ValidationError};
use std::fmt;
use tracing::{error, info, warn};

/// User-facing status reported by the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SettingsUpdated,
    Invalid(ValidationError),
    Port(PortError),
}

impl Notice {
    pub fn code(&self) -> String {
        match self {
            Notice::SettingsUpdated => "settings-updated".to_string(),
            Notice::Invalid(e) => e.code().to_string(),
            Notice::Port(e) => e.code().to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SettingsUpdated => write!(f, "Settings updated"),
            Notice::Invalid(e) => write!(f, "{e}"),
            Notice::Port(e) => write!(f, "MIDI Error: {e}"),
        }
    }
}

/// Receives notices for display. Must not block.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Renders notices through the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::SettingsUpdated => info!("[{}] {}", notice.code(), notice),
            Notice::Invalid(_) => warn!("[{}] {}", notice.code(), notice),
            Notice::Port(_) => error!("[{}] {}", notice.code(), notice),
        }
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Keeps every notice for later inspection
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        notices: Rc<RefCell<Vec<Notice>>>,
    }

    impl RecordingNotifier {
        pub fn take(&self) -> Vec<Notice> {
            self.notices.borrow_mut().drain(..).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.borrow_mut().push(notice);
        }
    }
}
