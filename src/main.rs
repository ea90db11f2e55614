//! Countdown Timer CLI
//!
//! A frame-driven countdown with start, pause, continue and cancel:
//! - `countdown run` drives a countdown in this terminal
//! - `countdown daemon` hosts one for `start`/`pause`/`resume`/`cancel`/`status`

use anyhow::Result;
use clap::{CommandFactory, Parser};

use countdown::cli::{run_interactive, Cli, Commands, Display, IpcClient};
use countdown::daemon::clock::FrameClock;
use countdown::daemon::ipc::{default_socket_path, run_daemon};
use countdown::daemon::runtime::spawn_event_logger;
use countdown::daemon::{CountdownEngine, CountdownRuntime};
use countdown::render::TextRenderer;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so the interactive status line on stdout stays intact.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    tracing::debug!("Verbose mode enabled");

    let client = || -> Result<IpcClient> {
        match &cli.socket {
            Some(path) => Ok(IpcClient::with_socket_path(path.clone())),
            None => IpcClient::new(),
        }
    };

    match cli.command.clone() {
        Some(Commands::Run(args)) => {
            let config = args.to_config();
            config.validate()?;

            let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
            let logger = spawn_event_logger(event_rx);

            let clock = FrameClock::new(std::time::Duration::from_millis(config.frame_interval_ms));
            let mut runtime = CountdownRuntime::new(CountdownEngine::new(config, event_tx), clock);

            println!("s: start/cancel  p: pause/continue  q: quit");
            run_interactive(
                &mut runtime,
                tokio::io::stdin(),
                tokio::io::stdout(),
                &TextRenderer::default(),
            )
            .await?;

            drop(runtime);
            let _ = logger.await;
        }
        Some(Commands::Start(args)) => {
            let response = client()?.start(&args).await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Pause) => {
            let response = client()?.pause().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Resume) => {
            let response = client()?.resume().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Cancel) => {
            let response = client()?.cancel().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Status) => {
            let response = client()?.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Daemon(args)) => {
            let socket_path = match &cli.socket {
                Some(path) => path.clone(),
                None => default_socket_path()?,
            };
            run_daemon(&socket_path, args.to_config()).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["countdown"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["countdown", "run", "--duration", "5"]);
        match cli.command {
            Some(Commands::Run(args)) => assert_eq!(args.to_config().duration_ms, 5_000),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_command_is_consistent() {
        Cli::command().debug_assert();
    }
}
