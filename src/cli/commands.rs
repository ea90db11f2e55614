//! Command definitions for the countdown CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{CountdownConfig, DEFAULT_DURATION_MS, DEFAULT_FRAME_INTERVAL_MS};

// ============================================================================
// CLI Structure
// ============================================================================

/// Countdown timer CLI
#[derive(Parser, Debug)]
#[command(
    name = "countdown",
    version,
    about = "フレーム駆動のカウントダウンタイマーCLI",
    long_about = "ターミナル上で動作するシンプルなカウントダウンタイマー。\n\
                  `run` で対話的に操作するか、`daemon` を起動して他のコマンドから操作します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (default: ~/.countdown/countdown.sock)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an interactive countdown in this terminal
    Run(TimerArgs),

    /// Start a countdown on the daemon
    Start(StartArgs),

    /// Pause the running countdown
    Pause,

    /// Continue a paused countdown
    #[command(alias = "continue")]
    Resume,

    /// Cancel the countdown
    Cancel,

    /// Show the current countdown status
    Status,

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon(TimerArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Countdown length and clock cadence for `run` and `daemon`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TimerArgs {
    /// Countdown length in seconds (1-86400)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_DURATION_MS / 1000,
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    pub duration: u64,

    /// Clock frame interval in milliseconds (1-1000)
    #[arg(
        long,
        default_value_t = DEFAULT_FRAME_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..=1000)
    )]
    pub frame_ms: u64,
}

impl TimerArgs {
    /// Builds the countdown configuration.
    pub fn to_config(&self) -> CountdownConfig {
        CountdownConfig::default()
            .with_duration_secs(self.duration)
            .with_frame_interval_ms(self.frame_ms)
    }
}

impl Default for TimerArgs {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS / 1000,
            frame_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct StartArgs {
    /// Countdown length in seconds (1-86400); the daemon's default if omitted
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    pub duration: Option<u64>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["countdown"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.socket.is_none());
        }

        #[test]
        fn test_parse_verbose_flag() {
            let cli = Cli::parse_from(["countdown", "-v", "status"]);
            assert!(cli.verbose);
        }

        #[test]
        fn test_parse_socket_after_subcommand() {
            let cli = Cli::parse_from(["countdown", "status", "--socket", "/tmp/c.sock"]);
            assert_eq!(cli.socket, Some(PathBuf::from("/tmp/c.sock")));
        }

        #[test]
        fn test_parse_simple_commands() {
            let cli = Cli::parse_from(["countdown", "pause"]);
            assert!(matches!(cli.command, Some(Commands::Pause)));

            let cli = Cli::parse_from(["countdown", "resume"]);
            assert!(matches!(cli.command, Some(Commands::Resume)));

            let cli = Cli::parse_from(["countdown", "continue"]);
            assert!(matches!(cli.command, Some(Commands::Resume)));

            let cli = Cli::parse_from(["countdown", "cancel"]);
            assert!(matches!(cli.command, Some(Commands::Cancel)));

            let cli = Cli::parse_from(["countdown", "status"]);
            assert!(matches!(cli.command, Some(Commands::Status)));
        }

        #[test]
        fn test_parse_completions_zsh() {
            let cli = Cli::parse_from(["countdown", "completions", "zsh"]);
            match cli.command {
                Some(Commands::Completions { shell }) => {
                    assert_eq!(shell, clap_complete::Shell::Zsh);
                }
                _ => panic!("Expected Completions command"),
            }
        }
    }

    mod timer_args_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::parse_from(["countdown", "run"]);
            match cli.command {
                Some(Commands::Run(args)) => {
                    assert_eq!(args, TimerArgs::default());
                    assert_eq!(args.to_config(), CountdownConfig::default());
                }
                _ => panic!("Expected Run command"),
            }
        }

        #[test]
        fn test_daemon_with_options() {
            let cli = Cli::parse_from(["countdown", "daemon", "-d", "60", "--frame-ms", "100"]);
            match cli.command {
                Some(Commands::Daemon(args)) => {
                    let config = args.to_config();
                    assert_eq!(config.duration_ms, 60_000);
                    assert_eq!(config.frame_interval_ms, 100);
                }
                _ => panic!("Expected Daemon command"),
            }
        }

        #[test]
        fn test_duration_out_of_range() {
            assert!(Cli::try_parse_from(["countdown", "run", "--duration", "0"]).is_err());
            assert!(Cli::try_parse_from(["countdown", "run", "--duration", "86401"]).is_err());
            assert!(Cli::try_parse_from(["countdown", "run", "--frame-ms", "0"]).is_err());
        }
    }

    mod start_args_tests {
        use super::*;

        #[test]
        fn test_start_without_duration() {
            let cli = Cli::parse_from(["countdown", "start"]);
            match cli.command {
                Some(Commands::Start(args)) => assert_eq!(args.duration, None),
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_start_with_duration() {
            let cli = Cli::parse_from(["countdown", "start", "--duration", "30"]);
            match cli.command {
                Some(Commands::Start(args)) => assert_eq!(args.duration, Some(30)),
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_start_rejects_zero() {
            assert!(Cli::try_parse_from(["countdown", "start", "-d", "0"]).is_err());
        }
    }
}
