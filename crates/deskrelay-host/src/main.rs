//! DeskRelay host agent entry point.
//!
//! Loads the configuration, wires the adapters into a [`HostAgent`], starts
//! the relay client, and runs the agent's event loop until shutdown.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ load config.toml (defaults written on first run, + CLI / env
//!  │  overrides) and machine-id
//!  ├─ RelayClient::spawn()  -- WebSocket reconnect loop
//!  │     ├─ ChannelEvent ──────────▶ agent event queue
//!  │     └─ OutboundMessage ◀────── agent outbound queue
//!  ├─ Ctrl-C   -> AgentEvent::Shutdown
//!  ├─ SIGUSR1  -> AgentEvent::ManualDisconnect (Unix)
//!  └─ HostAgent::run()      -- single task owning all session state
//! ```
//!
//! # Automation backend
//!
//! The agent drives a `HeadlessDesktop`, an in-process virtual screen.  A
//! native backend plugs in by implementing `InputAutomation` and
//! `ScreenCapture` and replacing it here.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use deskrelay_core::ScreenSize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use deskrelay_host::application::agent::{AgentDeps, AgentEvent, AgentSettings, HostAgent};
use deskrelay_host::infrastructure::{
    approver::PolicyApprover,
    automation::headless::HeadlessDesktop,
    identity,
    recorder::MjpegRecorder,
    relay::RelayClient,
    save_target::DirectoryPicker,
    storage::config::{
        config_file_path, load_config, write_defaults_if_missing, ApprovalPolicy, HostConfig,
    },
};

const VIRTUAL_SCREEN: ScreenSize = ScreenSize {
    width: 1920,
    height: 1080,
};

/// How long to wait for the relay adapter to close the socket on shutdown.
const RELAY_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// DeskRelay host agent.
///
/// Every option overrides the matching `config.toml` setting.
#[derive(Debug, Parser)]
#[command(name = "deskrelay-host", version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Relay WebSocket URL.
    #[arg(long, env = "DESKRELAY_RELAY_URL")]
    relay_url: Option<String>,

    /// How connection requests are decided.
    #[arg(long, value_enum, env = "DESKRELAY_APPROVAL")]
    approval: Option<ApprovalPolicy>,

    /// Directory finished recordings are saved to.
    #[arg(long, env = "DESKRELAY_RECORDINGS_DIR")]
    recordings_dir: Option<PathBuf>,

    /// Name announced to the relay instead of the hostname.
    #[arg(long)]
    computer_name: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut HostConfig) {
        if let Some(url) = &self.relay_url {
            config.relay.url = url.clone();
        }
        if let Some(approval) = self.approval {
            config.host.approval = approval;
        }
        if let Some(dir) = &self.recordings_dir {
            config.recording.output_dir = Some(dir.clone());
        }
        if let Some(name) = &self.computer_name {
            config.host.computer_name = Some(name.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("locating config directory (use --config)")?,
    };
    let first_run = write_defaults_if_missing(&config_path);
    let mut config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(config = %config_path.display(), "DeskRelay host starting");
    match first_run {
        Ok(true) => info!("wrote default configuration"),
        Ok(false) => {}
        Err(e) => warn!("could not write default configuration: {e}"),
    }

    let id_path = config_path
        .parent()
        .map(|dir| dir.join("machine-id"))
        .unwrap_or_else(|| PathBuf::from("machine-id"));
    let machine_id = identity::load_or_create(&id_path).context("loading machine id")?;
    let computer_name = config
        .host
        .computer_name
        .clone()
        .unwrap_or_else(identity::hostname);

    // ── Collaborators ─────────────────────────────────────────────────────────
    let desktop = Arc::new(HeadlessDesktop::new(VIRTUAL_SCREEN));
    let deps = AgentDeps {
        automation: desktop.clone(),
        capture: desktop.clone(),
        recorder: Arc::new(MjpegRecorder::new(desktop, config.recorder_settings())),
        picker: Arc::new(DirectoryPicker::new(config.recording.output_dir.clone())),
        approver: Arc::new(PolicyApprover::new(config.host.approval)),
    };
    let settings = AgentSettings {
        handshake: config.handshake_settings(computer_name, machine_id),
        stream: config.stream_settings(),
        recording: config.recording_settings(),
    };

    // ── Agent and relay ───────────────────────────────────────────────────────
    let (outbound_tx, outbound_rx) = unbounded_channel();
    let (events_tx, events_rx) = unbounded_channel();
    let agent = HostAgent::new(deps, settings, outbound_tx, events_tx.clone());

    let running = Arc::new(AtomicBool::new(true));
    let relay_config = config.relay_config();
    info!(url = %relay_config.url, "connecting to relay");
    let relay = RelayClient::new(relay_config).spawn(
        Arc::clone(&running),
        outbound_rx,
        events_tx.clone(),
    );

    // ── Signals ───────────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    let shutdown_tx = events_tx.clone();
    // A second Ctrl-C abandons a recording that is still being saved.
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
            if shutdown_tx.send(AgentEvent::Shutdown).is_err() {
                break;
            }
        }
    });
    spawn_manual_disconnect_listener(events_tx);

    agent.run(events_rx).await;

    // The agent dropped its outbound sender; the relay closes the socket.
    running.store(false, Ordering::Relaxed);
    if tokio::time::timeout(RELAY_SHUTDOWN_GRACE, relay).await.is_err() {
        warn!("relay adapter did not stop in time");
    }
    info!("DeskRelay host stopped");
    Ok(())
}

/// `kill -USR1 <pid>` drops the current controller.
#[cfg(unix)]
fn spawn_manual_disconnect_listener(events: UnboundedSender<AgentEvent>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = match signal(SignalKind::user_defined1()) {
        Ok(s) => s,
        Err(e) => {
            warn!("manual disconnect signal unavailable: {e}");
            return;
        }
    };
    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            if events.send(AgentEvent::ManualDisconnect).is_err() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_manual_disconnect_listener(_events: UnboundedSender<AgentEvent>) {}
