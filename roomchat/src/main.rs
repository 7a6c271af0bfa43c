//! `RoomChat` console host.
//!
//! Opens a room view against an in-process loopback gateway and feeds it
//! lines from stdin: each line counts as typing it into the input box and
//! pressing send. Every call the core makes against the room is echoed to
//! stdout. Configuration via CLI flags, environment variables, or config
//! file (`~/.config/roomchat/config.toml`).
//!
//! ```bash
//! cargo run --bin roomchat -- --room-id '!dev:example.org'
//! ```
//!
//! Host commands (not sent to the room): `:room <id>` switches rooms,
//! `:invite <names>` invites a comma- or space-separated list of users,
//! `:leave` leaves the room and exits, `:quit` exits. A successful `/join`
//! switches to the joined room.

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use roomchat::clock::TokioClock;
use roomchat::command::{DispatchNotice, DispatchOutcome};
use roomchat::config::{CliArgs, ClientConfig};
use roomchat::gateway::loopback::{GatewayCall, LoopbackGateway};
use roomchat::room_view::RoomView;
use roomchat_proto::room::{RoomId, UserId};

type ConsoleView = RoomView<LoopbackGateway, TokioClock>;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so they never interleave with the console output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("roomchat starting");
    let result = run(&config).await;
    tracing::info!("roomchat exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("roomchat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Read stdin line by line until EOF or `:quit`.
async fn run(config: &ClientConfig) -> io::Result<()> {
    let room_id = config.room_id();
    let gateway = open_gateway(room_id.clone());
    let (mut view, mut notices) =
        RoomView::open(room_id, gateway, TokioClock, config.room_view_config());

    println!(
        "{} in {} (messages or /commands; :room, :invite, :leave, :quit)",
        config.user_id,
        view.room_id()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed == ":quit" {
            break;
        }
        if let Some(target) = trimmed.strip_prefix(":room ") {
            notices = switch_to(&mut view, RoomId::new(target.trim())).await;
            continue;
        }
        if let Some(names) = trimmed.strip_prefix(":invite ") {
            match view.invite(names).await {
                Ok(users) if users.is_empty() => println!("  (nobody to invite)"),
                Ok(users) => println!("  invited {} user(s)", users.len()),
                Err(e) => println!("  error: {e}"),
            }
            drain_notices(&mut notices);
            continue;
        }
        if trimmed == ":leave" {
            if let Err(e) = view.leave().await {
                println!("  error: {e}");
            }
            return Ok(());
        }

        if let Err(e) = view.on_input_changed(&line) {
            tracing::warn!(error = %e, "typing debouncer unavailable");
        }

        match view.submit(&line).await {
            Ok(DispatchOutcome::JoinedRoom(joined)) => {
                notices = switch_to(&mut view, joined).await;
            }
            Ok(DispatchOutcome::Ignored(reason)) => println!("  (nothing sent: {reason})"),
            Ok(DispatchOutcome::SentMessage | DispatchOutcome::Executed) => {}
            Err(e) => println!("  error: {e}"),
        }

        drain_notices(&mut notices);
    }

    if let Err(e) = view.close().await {
        tracing::warn!(error = %e, "room view was already closed");
    }
    Ok(())
}

/// Create a loopback gateway for `room_id` and echo its calls to stdout.
fn open_gateway(room_id: RoomId) -> Arc<LoopbackGateway> {
    let (gateway, calls) = LoopbackGateway::new(room_id.clone());
    tokio::spawn(echo_calls(room_id, calls));
    Arc::new(gateway)
}

async fn switch_to(view: &mut ConsoleView, room_id: RoomId) -> mpsc::Receiver<DispatchNotice> {
    let gateway = open_gateway(room_id.clone());
    let notices = view.switch_room(room_id, gateway).await;
    println!("now in {}", view.room_id());
    notices
}

fn drain_notices(notices: &mut mpsc::Receiver<DispatchNotice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice {
            DispatchNotice::Forbidden { message } => println!("  ! {message}"),
        }
    }
}

/// Background task: print every call the core makes against one room.
async fn echo_calls(room_id: RoomId, mut calls: mpsc::UnboundedReceiver<GatewayCall>) {
    while let Some(call) = calls.recv().await {
        println!("  [{room_id}] {}", describe(&call));
    }
}

fn describe(call: &GatewayCall) -> String {
    match call {
        GatewayCall::Typing(notice) if notice.typing => {
            format!("typing (ttl {}ms)", notice.ttl_millis())
        }
        GatewayCall::Typing(_) => "stopped typing".to_string(),
        GatewayCall::TextMessage(body) => format!("message: {body}"),
        GatewayCall::Emote(message) => format!("* {message}"),
        GatewayCall::JoinRoom(alias) => format!("join {alias}"),
        GatewayCall::Kick(user) => format!("kick {user}"),
        GatewayCall::Ban(user, reason) if reason.is_empty() => format!("ban {user}"),
        GatewayCall::Ban(user, reason) => format!("ban {user} ({reason})"),
        GatewayCall::Unban(user) => format!("unban {user}"),
        GatewayCall::Invite(users) => {
            let names: Vec<_> = users.iter().map(UserId::as_str).collect();
            format!("invite {}", names.join(", "))
        }
        GatewayCall::Leave => "left the room".to_string(),
        GatewayCall::SetPowerLevel(user, level) => format!("power level of {user} -> {level}"),
        GatewayCall::UpdateDisplayName(name) => format!("display name -> {name}"),
    }
}
