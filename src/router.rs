use crate::config::SettingsFile;
use crate::directory::PortDirectory;
use crate::dispatch::dispatch;
use crate::error::PersistError;
use crate::msc::{GoEncoder, MscEncoder};
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::port_manager::{BindReport, PortManager};
use crate::settings::{Settings, SettingsStore, SettingsUpdate};
use crate::translator::{CueTrigger, MidiEvent, translate};
use crate::transport::MidiTransport;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

/// Owns the settings and the ports, and turns inbound events into cues.
///
/// Everything runs on one task; inbound MIDI arrives through the channel
/// handed to [`MscRouter::new`], so settings never change mid-translation.
pub struct MscRouter<T: MidiTransport, N: Notifier = LogNotifier, E: MscEncoder = GoEncoder> {
    store: SettingsStore,
    directory: PortDirectory,
    ports: PortManager<T>,
    storage: SettingsFile,
    notifier: N,
    encoder: E,
}

impl<T: MidiTransport> MscRouter<T> {
    pub fn new(transport: T, events: UnboundedSender<MidiEvent>, storage: SettingsFile) -> Self {
        Self::with_parts(transport, events, storage, LogNotifier, GoEncoder)
    }
}

impl<T: MidiTransport, N: Notifier, E: MscEncoder> MscRouter<T, N, E> {
    pub fn with_parts(
        transport: T,
        events: UnboundedSender<MidiEvent>,
        storage: SettingsFile,
        notifier: N,
        encoder: E,
    ) -> Self {
        Self {
            store: SettingsStore::default(),
            directory: PortDirectory::default(),
            ports: PortManager::new(transport, events),
            storage,
            notifier,
            encoder,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.store.current()
    }

    pub fn directory(&self) -> &PortDirectory {
        &self.directory
    }

    pub fn ports(&self) -> &PortManager<T> {
        &self.ports
    }

    /// Restore persisted settings, re-resolve ports by name and open them.
    pub fn start(&mut self) -> Result<(), PersistError> {
        self.refresh_ports();

        let persisted = match self.storage.load()? {
            Some(settings) => settings,
            None => {
                let defaults = Settings::default();
                self.storage.save(&defaults)?;
                defaults
            }
        };

        let settings = self.store.reconcile(persisted, &self.directory).clone();
        info!(
            "Listening on channel {} in {} mode, device {}, cuelist {}",
            settings.channel, settings.mode, settings.device_id, settings.cuelist
        );
        self.apply(&settings);
        Ok(())
    }

    /// Re-enumerate ports. On failure the previous snapshot is kept.
    pub fn refresh_ports(&mut self) -> &PortDirectory {
        match PortDirectory::refresh(self.ports.transport()) {
            Ok(directory) => self.directory = directory,
            Err(e) => warn!("Failed to enumerate MIDI ports: {}", e),
        }
        &self.directory
    }

    /// Submit a settings candidate from the settings form.
    ///
    /// Returns `Ok(false)` when the candidate was rejected; the previous
    /// settings stay in effect. Errors are persistence failures only; the
    /// previous settings and port bindings are kept then too.
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> Result<bool, PersistError> {
        let previous = self.store.current().clone();
        let settings = match self.store.validate_and_apply(update, &self.directory) {
            Ok(settings) => settings.clone(),
            Err(e) => {
                self.notifier.notify(Notice::Invalid(e));
                return Ok(false);
            }
        };

        // Settings only take effect once they are on disk
        if let Err(e) = self.storage.save(&settings) {
            self.store.restore(previous);
            return Err(e);
        }
        self.apply(&settings);
        self.notifier.notify(Notice::SettingsUpdated);
        self.refresh_ports();
        Ok(true)
    }

    fn apply(&mut self, settings: &Settings) {
        let report: BindReport = self.ports.apply_settings(settings);
        for err in report.errors() {
            self.notifier.notify(Notice::Port(err));
        }
    }

    /// Translate one inbound event and send the resulting cue, if any.
    pub fn handle_event(&mut self, event: &MidiEvent) -> Option<CueTrigger> {
        debug!(
            "MIDI In: channel {}, note {}, velocity {}",
            event.channel(),
            event.note,
            event.velocity
        );

        let trigger = translate(event, self.store.current())?;
        match dispatch(&trigger, &self.encoder, self.ports.output_mut()) {
            Ok(true) => info!("GO cue {} (list {})", trigger.cue, trigger.cue_list),
            Ok(false) => {}
            Err(e) => error!("Failed to send cue {}: {}", trigger.cue, e),
        }
        Some(trigger)
    }

    /// Close both ports.
    pub fn shutdown(&mut self) {
        info!("Closing MIDI ports");
        self.ports.close_all();
    }
}
