pub mod analysis;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod http;
pub mod pagination;
pub mod rate_limiter;
pub mod scheduler;
pub mod services;

use anyhow::Result;
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{Cli, Command};
use crate::config::settings::AppConfig;
use crate::database::{LogEntry, Severity, SqliteStateStore, StateStore};
use crate::services::export::ExportService;
use crate::services::server::ServerService;
use crate::services::{RunCoordinator, RunOutcome};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_run(force: bool) -> Result<()> {
    let config = AppConfig::from_env();
    let store = open_store(&config)?;
    let coordinator = RunCoordinator::from_config(&config, store)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(coordinator.run(force, Utc::now()))?;

    for entry in &report.entries {
        println!("{}", format_entry(entry));
    }
    match report.outcome {
        RunOutcome::ConfigUnavailable => anyhow::bail!("configuration unavailable"),
        _ => Ok(()),
    }
}

pub fn handle_serve(port: u16, interval_secs: u64) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::from_env();
        let store = open_store(&config)?;
        let coordinator = RunCoordinator::from_config(&config, store)?;
        let service = ServerService::new(
            port,
            Duration::from_secs(interval_secs),
            coordinator,
            config.server.admin_token.clone(),
        );
        service.run().await
    })
}

pub fn handle_logs(limit: usize) -> Result<()> {
    let config = AppConfig::from_env();
    let store = open_store(&config)?;

    let entries = store.recent_logs(limit)?;
    if entries.is_empty() {
        println!("No runs recorded yet");
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

pub fn handle_export(out: &Path) -> Result<()> {
    let config = AppConfig::from_env();
    let store = open_store(&config)?;

    let written = ExportService::new(store.as_ref(), out)?.run()?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn StateStore>> {
    Ok(Arc::new(SqliteStateStore::open(&config.store)?))
}

fn format_entry(entry: &LogEntry) -> String {
    let stamp = entry.at.format("%Y-%m-%d %H:%M:%S");
    let level = match entry.level {
        Severity::Info => entry.level.as_str().blue(),
        Severity::Success => entry.level.as_str().green(),
        Severity::Error => entry.level.as_str().red(),
    };
    format!("{} [{}] {}", stamp, level, entry.message)
}
