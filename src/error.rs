use thiserror::Error;

/// A settings candidate failed a range check. The whole update is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid input MIDI port {0}")]
    InvalidInputPort(i64),
    #[error("Invalid output MIDI port {0}")]
    InvalidOutputPort(i64),
    #[error("Channel must be between 1 and 16 (got {0})")]
    ChannelOutOfRange(i64),
    #[error("Invalid mode {0}")]
    InvalidMode(i64),
    #[error("Device ID must be between 0 and 111 (got {0})")]
    DeviceIdOutOfRange(i64),
    #[error("Cuelist must be between 1 and 99999 (got {0})")]
    CuelistOutOfRange(i64),
}

impl ValidationError {
    /// Stable identifier used by the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidInputPort(_) => "invalid-input-port",
            ValidationError::InvalidOutputPort(_) => "invalid-output-port",
            ValidationError::ChannelOutOfRange(_) => "channel-outofrange",
            ValidationError::InvalidMode(_) => "invalid-mode",
            ValidationError::DeviceIdOutOfRange(_) => "deviceid-outofrange",
            ValidationError::CuelistOutOfRange(_) => "cuelist-outofrange",
        }
    }
}

/// Failure reported by the native MIDI transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("MIDI backend unavailable: {0}")]
    Init(String),
    #[error("MIDI port {0} does not exist")]
    NoSuchPort(usize),
    #[error("MIDI connect failed: {0}")]
    Connect(String),
    #[error("MIDI send failed: {0}")]
    Send(String),
}

/// A port could not be opened. The direction is left unbound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error(
        "Can't open connection to the Input MIDI Port \"{port}\". \
         This is most likely because the MIDI device has been unplugged. (Code 301)"
    )]
    InputOpen {
        port: String,
        #[source]
        cause: TransportError,
    },
    #[error(
        "Can't open connection to the Output MIDI Port \"{port}\". \
         This is most likely because the MIDI device has been unplugged. (Code 302)"
    )]
    OutputOpen {
        port: String,
        #[source]
        cause: TransportError,
    },
}

impl PortError {
    pub fn code(&self) -> u16 {
        match self {
            PortError::InputOpen { .. } => 301,
            PortError::OutputOpen { .. } => 302,
        }
    }
}

/// The settings file cannot be trusted. Callers treat this as fatal.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("settings file is not valid JSON (Code 601)")]
    Malformed(#[source] serde_json::Error),
    #[error("settings file has a mistyped field (Code 602)")]
    InvalidField(#[source] serde_json::Error),
    #[error("settings file could not be written (Code 801)")]
    Write(#[source] std::io::Error),
    #[error("settings file could not be read (Code 802)")]
    Read(#[source] std::io::Error),
}

impl PersistError {
    pub fn code(&self) -> u16 {
        match self {
            PersistError::Malformed(_) => 601,
            PersistError::InvalidField(_) => 602,
            PersistError::Write(_) => 801,
            PersistError::Read(_) => 802,
        }
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Data => PersistError::InvalidField(e),
            Category::Io => PersistError::Read(std::io::Error::other(e)),
            Category::Syntax | Category::Eof => PersistError::Malformed(e),
        }
    }
}
