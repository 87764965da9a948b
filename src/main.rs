//! Entry point for the sync binary.

use std::process::ExitCode;

use clap::Parser;
use i18n_history_sync::cli::{
    Cli,
    Command,
};
use i18n_history_sync::engine::{
    self,
    SyncError,
    SyncOutcome,
};
use i18n_history_sync::history::GithubHistory;
use i18n_history_sync::store::HttpStore;
use i18n_history_sync::{
    SyncSettings,
    config,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(SyncOutcome::NothingToDo) => ExitCode::SUCCESS,
        Ok(SyncOutcome::Completed(report)) => {
            if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!(%err, "Sync run failed");
            ExitCode::FAILURE
        }
    }
}

/// Wire up the collaborators and dispatch the subcommand.
async fn run(cli: Cli) -> Result<SyncOutcome, SyncError> {
    let settings: SyncSettings = config::load(&cli.workspace)?;
    let store = HttpStore::new(cli.store_token, settings.platform.clone());

    match cli.command {
        Command::Sync { base, head } => {
            let history = GithubHistory::new(settings.repository.clone(), cli.history_token);
            engine::sync_range(&settings, &history, &store, &base, &head).await
        }
        Command::Push => {
            let report = engine::push_snapshot(&settings, &store, &cli.workspace).await?;
            Ok(SyncOutcome::Completed(report))
        }
    }
}
