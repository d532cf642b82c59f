use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Adaptive tournament match poller")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Run one poll cycle
    Run {
        /// Fetch every tournament and bypass the rollback guard
        #[arg(short, long)]
        force: bool,
    },
    /// Serve the JSON API and poll on a fixed tick
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        /// Seconds between scheduler ticks
        #[arg(short, long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// Print the most recent run log entries
    Logs {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Write the persisted state as JSON files
    Export {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_force() {
        let cli = Cli::try_parse_from(["match_poller", "run", "--force"]).unwrap();
        assert_eq!(cli.command, Command::Run { force: true });
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["match_poller", "serve"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Serve {
                port: 3000,
                interval_secs: 60
            }
        );
    }

    #[test]
    fn test_export_requires_out() {
        assert!(Cli::try_parse_from(["match_poller", "export"]).is_err());
    }
}
