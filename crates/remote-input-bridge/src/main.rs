//! Remote input bridge: terminal demo host.
//!
//! Opens one text-input dialog in the terminal and lets a second device on
//! the LAN drive it.  The dialog prints a URL and a QR code; opening that URL
//! on a phone shows a page whose text box and submit button act on the
//! terminal dialog exactly like local input.
//!
//! # Usage
//!
//! ```text
//! remote-input [OPTIONS]
//!
//! Options:
//!   --config <FILE>        TOML config file
//!   --host-ip <IP>         Address to advertise and bind (skips discovery)
//!   --port-start <PORT>    First candidate port [default: 12345]
//!   --port-end <PORT>      Last candidate port [default: 50000]
//!   --page <FILE>          Page served at GET / instead of the built-in one
//!   --title <TEXT>         Dialog title
//!   --initial <TEXT>       Text the dialog opens with
//!   --reject-spaces        Only accept text without spaces
//!   --reset                Offer a reset option
//! ```
//!
//! Local commands while the dialog is open: a line of text replaces the
//! dialog text, an empty line confirms, `/cancel` cancels, `/reset` resets.
//!
//! # Environment variable overrides
//!
//! | Variable                   | Flag              |
//! |----------------------------|-------------------|
//! | `REMOTE_INPUT_CONFIG`      | `--config`        |
//! | `REMOTE_INPUT_HOST_IP`     | `--host-ip`       |
//! | `REMOTE_INPUT_PORT_START`  | `--port-start`    |
//! | `REMOTE_INPUT_PORT_END`    | `--port-end`      |
//! | `REMOTE_INPUT_PAGE`        | `--page`          |
//! | `RUST_LOG`                 | log filter        |

use std::io::{self, BufRead};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use remote_input_core::{DialogOutcome, DialogSnapshot, TextInputRequest};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use remote_input_bridge::application::{
    DialogBridge, DialogHandle, DialogPresenter, RemoteAccess, SessionHandlerRegistry, UiContext,
    UiDispatcher,
};
use remote_input_bridge::domain::BridgeConfig;
use remote_input_bridge::infrastructure::{load_config_or_default, BridgeServer, QrCodeGenEncoder};

/// Half blocks use one column per cell; keep the code within a standard
/// terminal width.
const TERMINAL_QR_SIZE: u32 = 80;

const SPACES_ERROR: &str = "Spaces are not allowed";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Type into this terminal from a phone on the same network.
#[derive(Debug, Parser)]
#[command(
    name = "remote-input",
    about = "Open a text-input dialog that a second device on the LAN can fill in",
    version
)]
struct Cli {
    /// TOML config file; flags below override its values.
    #[arg(long, env = "REMOTE_INPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to advertise and bind instead of discovering one.
    #[arg(long, env = "REMOTE_INPUT_HOST_IP")]
    host_ip: Option<IpAddr>,

    /// First candidate port for the listener.
    #[arg(long, env = "REMOTE_INPUT_PORT_START")]
    port_start: Option<u16>,

    /// Last candidate port for the listener (inclusive).
    #[arg(long, env = "REMOTE_INPUT_PORT_END")]
    port_end: Option<u16>,

    /// HTML file served at `GET /` instead of the built-in page.
    #[arg(long, env = "REMOTE_INPUT_PAGE")]
    page: Option<PathBuf>,

    /// Dialog title.
    #[arg(long, default_value = "Enter text")]
    title: String,

    /// Text the dialog opens with; also the result of cancelling.
    #[arg(long, default_value = "")]
    initial: String,

    /// Disable submit while the text contains a space.
    #[arg(long)]
    reject_spaces: bool,

    /// Offer a reset option.
    #[arg(long)]
    reset: bool,
}

impl Cli {
    /// Applies the flags that were given on top of `config`.
    fn apply_overrides(&self, mut config: BridgeConfig) -> BridgeConfig {
        if let Some(ip) = self.host_ip {
            config.host_ip = Some(ip);
        }
        if let Some(start) = self.port_start {
            config.port_range_start = start;
        }
        if let Some(end) = self.port_end {
            config.port_range_end = end;
        }
        if let Some(page) = &self.page {
            config.page_path = Some(page.clone());
        }
        config
    }

    fn text_request(&self) -> TextInputRequest {
        let mut request = TextInputRequest::new(&self.title, &self.initial);
        if self.reject_spaces {
            request = request
                .with_hint("No spaces")
                .with_error(SPACES_ERROR)
                .with_validator(|text| !text.contains(' '));
        }
        if self.reset {
            request = request.with_reset("Reset");
        }
        request
    }
}

// ── Terminal presenter ────────────────────────────────────────────────────────

/// One line typed on stdin while the dialog is open.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalCommand {
    Confirm,
    Cancel,
    Reset,
    SetText(String),
}

impl LocalCommand {
    fn parse(line: &str) -> Self {
        match line.trim_end_matches(['\r', '\n']) {
            "" => LocalCommand::Confirm,
            "/cancel" => LocalCommand::Cancel,
            "/reset" => LocalCommand::Reset,
            text => LocalCommand::SetText(text.to_string()),
        }
    }

    /// Runs on the UI context.
    fn apply(self, dialog: &DialogHandle) {
        match self {
            LocalCommand::Confirm => {
                dialog.confirm();
            }
            LocalCommand::Cancel => {
                dialog.cancel();
            }
            LocalCommand::Reset => {
                if !dialog.reset() {
                    println!("(this dialog has no reset option)");
                }
            }
            LocalCommand::SetText(text) => {
                dialog.set_text(text);
            }
        }
    }
}

/// Draws the dialog as text and reads local commands from stdin.
struct TerminalPresenter {
    runtime: Handle,
    ui: UiDispatcher,
}

impl DialogPresenter for TerminalPresenter {
    fn show(&self, dialog: DialogHandle, remote: Option<RemoteAccess>) {
        let snapshot = dialog.snapshot();
        println!();
        println!("== {} ==", snapshot.title);
        if let Some(hint) = &snapshot.hint {
            println!("{hint}");
        }
        match remote {
            Some(access) => {
                println!("Type on another device: {}", access.url);
                if let Some(qr) = access.qr {
                    for line in qr.to_half_block_lines() {
                        println!("{line}");
                    }
                }
            }
            None => println!("(remote input unavailable; local input only)"),
        }
        print_snapshot(&snapshot);
        println!("Enter a line to replace the text, an empty line to confirm, /cancel to cancel.");

        self.runtime.spawn(print_changes(dialog.subscribe()));
        spawn_stdin_reader(dialog, self.ui.clone());
    }
}

fn print_snapshot(snapshot: &DialogSnapshot) {
    let status = if snapshot.submit_enabled {
        "ok"
    } else {
        snapshot.error.as_deref().unwrap_or("invalid")
    };
    println!("text: {:?} [{status}]", snapshot.text);
}

async fn print_changes(mut snapshots: watch::Receiver<DialogSnapshot>) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.closed {
            break;
        }
        print_snapshot(&snapshot);
    }
}

fn spawn_stdin_reader(dialog: DialogHandle, ui: UiDispatcher) {
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let command = LocalCommand::parse(&line);
                let target = dialog.clone();
                if ui.post(move || command.apply(&target)).is_err() || dialog.is_closed() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("could not read local input: {e}");
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Parse flags, load the config file, apply overrides, validate.
/// 2. Initialise `tracing` (`RUST_LOG`, else the configured `log_level`).
/// 3. Start the UI context and the bridge server.  A server that cannot
///    start leaves the dialog local-only.
/// 4. Run one dialog session until it resolves or Ctrl+C dismisses it.
/// 5. Print the outcome and shut everything down.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    let config = cli.apply_overrides(config);
    config.validate().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let ui = UiContext::spawn().context("failed to start the UI context")?;
    let registry = SessionHandlerRegistry::new();

    let server = match BridgeServer::start(&config, registry.clone(), ui.dispatcher()).await {
        Ok(server) => Some(server),
        Err(e) => {
            warn!("remote input unavailable: {e}");
            None
        }
    };

    let presenter = Arc::new(TerminalPresenter {
        runtime: Handle::current(),
        ui: ui.dispatcher(),
    });
    let mut bridge = DialogBridge::new(registry, ui.dispatcher(), presenter);
    if let Some(server) = &server {
        bridge = bridge.with_endpoint(server.endpoint()).with_qr_encoder(
            Arc::new(QrCodeGenEncoder::default()),
            config.qr_size.min(TERMINAL_QR_SIZE),
        );
    }

    // Ctrl+C drops the request future, which dismisses the dialog.
    let outcome = tokio::select! {
        outcome = bridge.request_text_input(cli.text_request()) => Some(outcome),
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C; dismissing dialog");
            None
        }
    };
    match outcome {
        Some(DialogOutcome::Text(text)) => println!("{text}"),
        Some(DialogOutcome::Reset) => println!("(reset)"),
        None => {}
    }

    if let Some(server) = server {
        server.shutdown().await;
    }
    tokio::task::spawn_blocking(move || ui.shutdown())
        .await
        .context("UI context shutdown failed")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use remote_input_core::DialogState;

    #[test]
    fn test_cli_defaults_leave_config_untouched() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["remote-input"]);

        // Act
        let config = cli.apply_overrides(BridgeConfig::default());

        // Assert
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_cli_port_range_override() {
        let cli = Cli::parse_from(["remote-input", "--port-start", "20000", "--port-end", "20010"]);
        let config = cli.apply_overrides(BridgeConfig::default());
        assert_eq!(config.port_range(), 20000..=20010);
    }

    #[test]
    fn test_cli_host_ip_override() {
        let cli = Cli::parse_from(["remote-input", "--host-ip", "10.0.0.5"]);
        let config = cli.apply_overrides(BridgeConfig::default());
        assert_eq!(config.host_ip, Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn test_cli_flag_wins_over_file_value() {
        // Arrange: the file set a page, the flag names another
        let from_file = BridgeConfig {
            page_path: Some(PathBuf::from("file.html")),
            ..BridgeConfig::default()
        };
        let cli = Cli::parse_from(["remote-input", "--page", "flag.html"]);

        // Act
        let config = cli.apply_overrides(from_file);

        // Assert
        assert_eq!(config.page_path, Some(PathBuf::from("flag.html")));
    }

    #[test]
    fn test_cli_invalid_host_ip_is_rejected() {
        assert!(Cli::try_parse_from(["remote-input", "--host-ip", "not.an.ip"]).is_err());
    }

    #[test]
    fn test_text_request_defaults() {
        let cli = Cli::parse_from(["remote-input", "--initial", "foo"]);

        let request = cli.text_request();

        assert_eq!(request.title, "Enter text");
        assert_eq!(request.initial, "foo");
        assert!(!request.reset_available());
    }

    #[test]
    fn test_reject_spaces_installs_validator() {
        let cli = Cli::parse_from(["remote-input", "--reject-spaces"]);

        let mut state = DialogState::open(cli.text_request());

        assert!(!state.set_text("a b"));
        assert_eq!(state.error_text(), Some(SPACES_ERROR));
        assert!(state.set_text("ab"));
    }

    #[test]
    fn test_reset_flag_offers_reset() {
        let cli = Cli::parse_from(["remote-input", "--reset"]);
        assert!(cli.text_request().reset_available());
    }

    #[test]
    fn test_local_command_parsing() {
        assert_eq!(LocalCommand::parse(""), LocalCommand::Confirm);
        assert_eq!(LocalCommand::parse("\r\n"), LocalCommand::Confirm);
        assert_eq!(LocalCommand::parse("/cancel"), LocalCommand::Cancel);
        assert_eq!(LocalCommand::parse("/reset"), LocalCommand::Reset);
        assert_eq!(
            LocalCommand::parse("hello world"),
            LocalCommand::SetText("hello world".to_string())
        );
    }
}
