mod config;
mod console;
mod directory;
mod dispatch;
mod error;
mod midir_backend;
mod msc;
mod notify;
mod port_manager;
mod router;
mod settings;
mod translator;
mod transport;

use crate::config::SettingsFile;
use crate::console::Command;
use crate::directory::PortDirectory;
use crate::error::PersistError;
use crate::midir_backend::MidirTransport;
use crate::router::MscRouter;
use crate::transport::MidiTransport;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Trigger MIDI Show Control cues from a MIDI controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, env = "MSC_BRIDGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Name this client registers with the MIDI subsystem
    #[arg(long, default_value = "midi-msc-bridge")]
    client_name: String,

    /// List available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level)?;

    info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let transport = MidirTransport::new(args.client_name.clone());

    if args.list_ports {
        let directory =
            PortDirectory::refresh(&transport).context("Failed to enumerate MIDI ports")?;
        println!("Inputs:");
        print_ports(directory.inputs());
        println!("Outputs:");
        print_ports(directory.outputs());
        return Ok(());
    }

    let storage = SettingsFile::new(args.settings.unwrap_or_else(SettingsFile::default_path));
    info!("Settings file: {}", storage.path().display());

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut router = MscRouter::new(transport, events_tx, storage.clone());
    router.start().map_err(|e| corruption(e, &storage))?;

    info!("MIDI MSC bridge ready, type 'help' for commands");

    let mut lines = console::spawn_reader();
    let mut console_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                router.handle_event(&event);
            }
            line = lines.recv(), if console_open => match line {
                Some(line) => {
                    let quit = run_command(&mut router, &line)
                        .map_err(|e| corruption(e, &storage))?;
                    if quit {
                        break;
                    }
                }
                None => console_open = false,
            },
            _ = &mut shutdown => {
                break;
            }
        }
    }

    info!("Shutting down MIDI MSC bridge");
    router.shutdown();

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level '{level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn print_ports(names: &[String]) {
    if names.is_empty() {
        println!("  (none)");
    }
    for (id, name) in names.iter().enumerate() {
        println!("  {id:>3}  {name}");
    }
}

/// Returns `true` when the console asked to quit.
fn run_command<T: MidiTransport>(
    router: &mut MscRouter<T>,
    line: &str,
) -> Result<bool, PersistError> {
    let command = match console::parse_line(line) {
        None => return Ok(false),
        Some(Ok(command)) => command,
        Some(Err(e)) => {
            warn!("{}", e);
            return Ok(false);
        }
    };

    match command {
        Command::Show => {
            println!("{}", console::format_settings(router.settings()));
            println!(
                "bound   in: {}, out: {}",
                router.ports().input_state(),
                router.ports().output_state()
            );
        }
        Command::Ports => {
            router.refresh_ports();
            println!(
                "{}",
                console::format_ports(router.directory(), router.settings())
            );
        }
        Command::Set(assignments) => {
            let update = console::build_update(router.settings(), &assignments);
            router.update_settings(&update)?;
        }
        Command::Help => println!("{}", console::HELP),
        Command::Quit => return Ok(true),
    }
    Ok(false)
}

fn corruption(err: PersistError, storage: &SettingsFile) -> anyhow::Error {
    error!(
        "The settings file has become corrupt (Code {}). Please delete {} and restart.",
        err.code(),
        storage.path().display()
    );
    anyhow!(err).context("Unrecoverable settings error")
}
