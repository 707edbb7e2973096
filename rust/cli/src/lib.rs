//! # No Thanks! CLI
//!
//! Offline tools around the game engine and the bot policies.
//!
//! ## Main Entry Point
//!
//! [`run`] parses command-line arguments and executes the subcommand.
//!
//! ## Available Subcommands
//!
//! - `sim`: play all-bot rounds and report wins and mean scores
//! - `deal`: deal one round and print the removed set and draw order
//! - `cfg`: display the resolved configuration with sources
//!
//! ```
//! use std::io;
//! let args = vec!["nothanks", "deal", "--seed", "42"];
//! let code = nothanks_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```

use clap::Parser;
use std::io::Write;
pub mod cli;
mod commands;
pub mod config;
mod error;
pub mod exit_code;
pub mod ui;

use cli::{Commands, NothanksCli};
use commands::{SimOptions, handle_cfg_command, handle_deal_command, handle_sim_command};

pub use error::CliError;

const COMMANDS: &[&str] = &["sim", "deal", "cfg"];

/// Parses `args` and runs the chosen subcommand.
///
/// Returns the process exit code: [`exit_code::SUCCESS`] or
/// [`exit_code::ERROR`]. Help and version output go to `out` and succeed.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match NothanksCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return report_parse_error(e, out, err),
    };

    let result = match cli.cmd {
        Commands::Sim {
            games,
            bots,
            seed,
            output,
            policy,
        } => handle_sim_command(
            SimOptions {
                games,
                bots,
                seed,
                output,
                policy,
            },
            out,
            err,
        ),
        Commands::Deal { seed, removed } => handle_deal_command(seed, removed, out, err),
        Commands::Cfg => handle_cfg_command(out, err),
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        // handlers already reported these on `err`
        Err(CliError::InvalidInput(_)) | Err(CliError::Config(_)) => exit_code::ERROR,
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            exit_code::ERROR
        }
    }
}

fn report_parse_error(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            if write!(out, "{}", e).is_err() {
                return exit_code::ERROR;
            }
            exit_code::SUCCESS
        }
        _ => {
            if writeln!(err, "{}", e).is_err()
                || writeln!(err).is_err()
                || writeln!(err, "No Thanks! CLI").is_err()
                || writeln!(err, "Usage: nothanks <command> [options]\n").is_err()
                || writeln!(err, "Commands:").is_err()
            {
                return exit_code::ERROR;
            }
            for c in COMMANDS {
                if writeln!(err, "  {}", c).is_err() {
                    return exit_code::ERROR;
                }
            }
            let _ = writeln!(err, "\nFor full help, run: nothanks --help");
            exit_code::ERROR
        }
    }
}
