//! gbs-control CLI - control panel for the GBS line doubler / scaler.
//!
//! This is the main binary entry point. See the `gbs_control` library
//! for the link session and protocol decoding.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gbs_control::constants::WS_SUBPROTOCOL;
use gbs_control::protocol::Slot;
use gbs_control::ui::ConsoleReflector;
use gbs_control::{
    CommandChannel, CommandSender, Config, LinkRunner, LinkTiming, RunnerSettings, Session,
    SlotNames, WsTransport,
};
use mimalloc::MiMalloc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// mimalloc for the long-running panel.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Set by SIGINT/SIGTERM/SIGHUP; polled by the link runner.
static SHUTDOWN_FLAG: std::sync::LazyLock<Arc<AtomicBool>> =
    std::sync::LazyLock::new(|| Arc::new(AtomicBool::new(false)));

#[derive(Parser)]
#[command(name = "gbs-control")]
#[command(version, about = "Control panel for the GBS line doubler / scaler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the device and run an interactive console session
    Run {
        /// Device host name or IP (overrides config and GBS_CONTROL_HOST)
        #[arg(long)]
        host: Option<String>,
    },
    /// Send a single command and wait for the device to accept it
    Send {
        /// Send on the user channel (/uc)
        #[arg(long, conflicts_with = "doc")]
        user: bool,
        /// Send on the document channel (/sc)
        #[arg(long)]
        doc: bool,
        /// Device host name or IP
        #[arg(long)]
        host: Option<String>,
        /// Command code
        code: String,
    },
    /// Manage local slot names
    Slots {
        #[command(subcommand)]
        action: SlotsAction,
    },
    /// Show the effective configuration, optionally saving a new device host
    Config {
        /// Device host name or IP to store in config.json
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Subcommand)]
enum SlotsAction {
    /// List slots with their names
    List,
    /// Name a slot
    Name {
        /// Slot (1-9 or slotN)
        slot: Slot,
        /// Display name
        name: String,
    },
}

fn load_config(host: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(host) = host {
        config.host = host;
    }
    Ok(config)
}

/// Run the interactive panel until quit or a signal.
fn run_panel(config: &Config) -> Result<()> {
    // Signals only raise the flag; the runner notices on its next tick.
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::flag;
    flag::register(SIGINT, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGTERM, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGHUP, Arc::clone(&SHUTDOWN_FLAG))?;

    // Single logical thread: link, watchdog and UI share one scheduler
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        let (transport, events) = WsTransport::new(WS_SUBPROTOCOL);
        let session = Session::new(config.ws_url(), LinkTiming::from(config));
        let sender = CommandSender::new(&config.http_base_url())?;

        let mut runner = LinkRunner::new(
            session,
            transport,
            events,
            ConsoleReflector::stdout(),
            sender,
            RunnerSettings::from(config),
        );
        match SlotNames::open_default() {
            Ok(names) => runner = runner.with_slot_names(names),
            Err(e) => log::warn!("Slot names unavailable: {e:#}"),
        }

        tokio::spawn(gbs_control::ui::console::forward_stdin(
            runner.request_sender(),
        ));

        println!(
            "gbs-control v{} - {} (type 'status' or 'quit')",
            env!("CARGO_PKG_VERSION"),
            config.ws_url()
        );
        runner.run(&SHUTDOWN_FLAG).await
    });
    // stdin reads sit on a blocking thread that never returns on its own
    runtime.shutdown_timeout(std::time::Duration::from_millis(200));
    result?;

    println!("Shutting down...");
    Ok(())
}

fn send_one(config: &Config, channel: CommandChannel, code: &str) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let sender = CommandSender::new(&config.http_base_url())?;
    runtime.block_on(sender.send_and_wait(channel, code))?;
    println!("sent {} {}", channel, code);
    Ok(())
}

fn slots(action: SlotsAction) -> Result<()> {
    let mut names = SlotNames::open_default()?;
    match action {
        SlotsAction::List => {
            for slot in Slot::all() {
                println!("{slot}: {}", names.display_name(slot));
            }
        }
        SlotsAction::Name { slot, name } => {
            names.write(&slot.id(), &name)?;
            println!("{slot}: {name}");
        }
    }
    Ok(())
}

fn open_log_file(path: &std::path::Path) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file at {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to a file so device terminal output on stdout stays readable.
    // Use GBS_CONTROL_LOG_FILE or <config dir>/gbs-control.log. Appended, so
    // one-shot commands keep the last session's log.
    let log_path = match std::env::var("GBS_CONTROL_LOG_FILE") {
        Ok(path) => std::path::PathBuf::from(path),
        Err(_) => Config::config_dir()?.join("gbs-control.log"),
    };
    let log_file = open_log_file(&log_path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format_timestamp_secs()
        .init();

    match cli.command {
        Commands::Run { host } => {
            let config = load_config(host)?;
            log::info!("gbs-control v{} starting", env!("CARGO_PKG_VERSION"));
            run_panel(&config)?;
        }
        Commands::Send {
            user,
            doc: _,
            host,
            code,
        } => {
            let config = load_config(host)?;
            let channel = if user {
                CommandChannel::User
            } else {
                CommandChannel::Document
            };
            send_one(&config, channel, &code)?;
        }
        Commands::Slots { action } => slots(action)?,
        Commands::Config { host } => {
            let mut config = Config::load()?;
            if let Some(host) = host {
                config.host = host;
                config.save()?;
                log::info!("Saved device host {}", config.host);
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_keeps_previous_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gbs-control.log");

        writeln!(open_log_file(&path).unwrap(), "run session").unwrap();
        writeln!(open_log_file(&path).unwrap(), "config").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "run session\nconfig\n");
    }
}
