use anyhow::Result;

use match_poller::cli::Command;
use match_poller::{handle_completions, handle_export, handle_logs, handle_run, handle_serve, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Run { force } => handle_run(*force),
        Command::Serve { port, interval_secs } => handle_serve(*port, *interval_secs),
        Command::Logs { limit } => handle_logs(*limit),
        Command::Export { out } => handle_export(out),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
