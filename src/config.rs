use crate::error::PersistError;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "midi-msc-bridge";
const SETTINGS_FILE: &str = "settings.json";

/// On-disk layout: `{ "settings": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
struct SettingsDocument {
    settings: Settings,
}

/// JSON file that persists settings between runs
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<config dir>/midi-msc-bridge/settings.json`, or `./settings.json`
    /// when the platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored settings. `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<Settings>, PersistError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Settings file not found: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(PersistError::Read(e)),
        };

        let document: SettingsDocument = serde_json::from_str(&content)?;
        debug!("Settings restored from {}", self.path.display());
        Ok(Some(document.settings))
    }

    pub fn save(&self, settings: &Settings) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(PersistError::Write)?;
        }

        let document = SettingsDocument {
            settings: settings.clone(),
        };
        let json = serde_json::to_string_pretty(&document).map_err(PersistError::Malformed)?;
        fs::write(&self.path, json).map_err(PersistError::Write)?;

        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Mode;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            input_port_id: 2,
            input_port_name: "USB MIDI 1".to_string(),
            channel: 10,
            mode: Mode::Advanced,
            device_id: 7,
            cuelist: 250,
            ..Settings::default()
        };

        file.save(&settings).unwrap();
        assert_eq!(file.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));

        assert_eq!(file.load().unwrap(), None);
        assert!(!file.path().exists());
    }

    #[test]
    fn test_stored_field_names() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));
        file.save(&Settings::default()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
        let stored = &raw["settings"];
        assert_eq!(stored["inputPortID"], 0);
        assert_eq!(stored["outputPortName"], "");
        assert_eq!(stored["deviceID"], 0);
        assert_eq!(stored["mode"], 0);
        assert_eq!(stored["cuelist"], 1);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));
        fs::write(file.path(), r#"{"settings":{"channel":3,"deviceID":-1}}"#).unwrap();

        let settings = file.load().unwrap().unwrap();
        assert_eq!(settings.channel, 3);
        assert_eq!(settings.device_id, -1);
        assert_eq!(settings.cuelist, 1);
    }

    #[test]
    fn test_malformed_json_is_corruption() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));
        fs::write(file.path(), "{ settings: ").unwrap();

        assert_eq!(file.load().unwrap_err().code(), 601);
    }

    #[test]
    fn test_non_integer_field_is_corruption() {
        let dir = TempDir::new().unwrap();
        let file = SettingsFile::new(dir.path().join("settings.json"));
        fs::write(file.path(), r#"{"settings":{"channel":"one"}}"#).unwrap();
        assert_eq!(file.load().unwrap_err().code(), 602);

        fs::write(file.path(), r#"{"settings":{"mode":4}}"#).unwrap();
        assert_eq!(file.load().unwrap_err().code(), 602);
    }

    #[test]
    fn test_unreadable_path_is_read_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a file
        let file = SettingsFile::new(dir.path());
        assert_eq!(file.load().unwrap_err().code(), 802);
    }
}
