//! ttt: terminal sender for a remote tic-tac-toe receiver.
//!
//! Launches a session on the receiver, then reads commands from stdin
//! (`play`, `move <row> <col>`, `quit`, `stop`) and redraws the board as
//! the receiver reports moves.

mod config;
mod input;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::tty::IsTty;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};
use ttt_sender::{SessionController, WebSocketTransport};

use input::InputCommand;

/// ttt: tic-tac-toe sender
#[derive(Parser)]
#[command(
    name = "ttt",
    version = "0.1.0",
    about = "Play tic-tac-toe on a remote receiver over a WebSocket session"
)]
struct Cli {
    /// Receiver WebSocket URL (ws:// or wss://)
    #[arg(short, long)]
    url: Option<String>,

    /// Player name sent when joining
    #[arg(short, long)]
    name: Option<String>,

    /// Message namespace for game traffic
    #[arg(long)]
    namespace: Option<String>,

    /// Config file path
    #[arg(long = "config")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("ttt=debug,ttt_cli=debug,ttt_sender=debug,ttt_core=debug")
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("ttt=warn,ttt_cli=warn,ttt_sender=warn")
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("ttt: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(|| {
        let home = dirs::home_dir().unwrap_or_default();
        home.join(".ttt").join("config.toml").to_string_lossy().to_string()
    });
    let cfg = config::Config::load(&config_path)?;

    // CLI flags override config values.
    let mut receiver = cfg.receiver;
    if let Some(url) = cli.url {
        receiver.url = url;
    }
    if let Some(name) = cli.name {
        receiver.player_name = name;
    }
    if let Some(namespace) = cli.namespace {
        receiver.namespace = namespace;
    }
    if receiver.url.is_empty() {
        anyhow::bail!("no receiver URL: pass --url or set [receiver] url in {config_path}");
    }

    let transport = WebSocketTransport::new(receiver.url.as_str())
        .with_context(|| format!("cannot use receiver at {}", receiver.url))?;
    debug!(url = transport.url(), "using WebSocket transport");

    let styled = std::io::stdout().is_tty();
    let mut controller = SessionController::new(transport, receiver.controller_config());
    controller.add_observer(Box::new(view::TerminalView::new(styled, cli.verbose)));
    let handle = controller.handle();

    println!("{}", input::HELP);
    controller.initialize();
    let task = tokio::spawn(controller.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match input::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e:#}");
                continue;
            }
        };

        match command {
            InputCommand::Play => handle.play()?,
            InputCommand::Stop => handle.stop()?,
            InputCommand::Quit => handle.quit()?,
            InputCommand::Move { row, column } => handle.move_to(row, column)?,
            InputCommand::Help => println!("{}", input::HELP),
            InputCommand::Exit => break,
        }
    }

    // End the game on the receiver before leaving.
    handle.stop()?;
    handle.shutdown()?;
    task.await.context("controller task failed")?;
    Ok(())
}
