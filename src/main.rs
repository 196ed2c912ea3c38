//! Recall Sync - command line entry point
//!
//! Replicates recalled notes into a Notion database, once or on an interval.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recall_sync::browser::{BrowserSession, SessionLauncher, WebDriverLauncher};
use recall_sync::notion::NotionApiReplicator;
use recall_sync::orchestrator::{Scheduler, SyncRunner};
use recall_sync::recall::HttpRecallClient;
use recall_sync::reconcile::{is_login_url, ReconcileSettings, UiReplicator};
use recall_sync::state::StateStore;
use recall_sync::sync::Replicator;
use recall_sync::{Config, Strategy};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOGIN_POLL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "recall-sync")]
#[command(about = "Replicate recalled notes into a Notion database")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file (default: ./recall-sync.yaml)
    #[arg(short, long, global = true, env = "RECALL_SYNC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass, or keep syncing on an interval
    Run {
        /// Repeat every SYNC_INTERVAL_MINUTES until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Print the change set without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Open a visible browser on the database and wait for a login
    Login,

    /// Show what the state file currently records
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { watch, dry_run } => run(config, watch, dry_run).await,
        Commands::Login => login(config).await,
        Commands::Status => status(config).await,
    }
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recall_sync=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

fn build_replicator(config: &Config) -> Result<Arc<dyn Replicator>> {
    let replicator: Arc<dyn Replicator> = match config.target.strategy {
        Strategy::Ui => {
            let launcher = WebDriverLauncher::from_config(&config.browser)?;
            Arc::new(UiReplicator::new(
                Arc::new(launcher),
                ReconcileSettings::from_config(config),
            ))
        }
        Strategy::Api => Arc::new(NotionApiReplicator::from_config(&config.target)?),
    };
    Ok(replicator)
}

async fn run(config: Config, watch: bool, dry_run: bool) -> Result<ExitCode> {
    config.validate()?;

    let source = Arc::new(HttpRecallClient::from_config(&config.recall)?);
    let replicator = build_replicator(&config)?;
    let runner = SyncRunner::new(
        source,
        replicator,
        StateStore::new(config.sync.state_file.clone()),
        config.sync.max_per_run,
    );

    if dry_run {
        let (fetched, change_set) = runner.dry_run().await?;
        println!(
            "Fetched {} notes, {} changed, {} would sync this pass, {} deferred",
            fetched,
            change_set.total_changed,
            change_set.len(),
            change_set.deferred()
        );
        for note in &change_set.notes {
            println!("  {}  {}", note.source_id, note.title);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let scheduler = Scheduler::new(Arc::new(runner), config.sync.interval);

    if watch || config.sync.watch {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping after the current pass");
                on_signal.cancel();
            }
        });

        let stats = scheduler.watch(cancel).await;
        tracing::info!(
            passes = stats.passes,
            failed_passes = stats.failed_passes,
            "Watch mode stopped"
        );
        return Ok(ExitCode::SUCCESS);
    }

    let summary = scheduler.run_once().await?;
    Ok(if summary.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn login(config: Config) -> Result<ExitCode> {
    if config.target.database_url.is_empty() {
        anyhow::bail!("Missing required environment variable: NOTION_DATABASE_URL");
    }

    let launcher = WebDriverLauncher::from_config(&config.browser)?.headless(false);
    let session = launcher
        .launch()
        .await
        .context("Failed to start a browser session (is the WebDriver running?)")?;

    let result = wait_for_login(session.as_ref(), &config).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
    result.map(|_| ExitCode::SUCCESS)
}

/// Poll until the session leaves the login surface or the login timeout passes.
async fn wait_for_login(session: &dyn BrowserSession, config: &Config) -> Result<()> {
    session.goto(&config.target.database_url).await?;
    println!(
        "Log in to Notion in the opened browser window (waiting up to {}s)...",
        config.browser.login_timeout.as_secs()
    );

    let deadline = Instant::now() + config.browser.login_timeout;
    loop {
        tokio::time::sleep(LOGIN_POLL).await;
        let url = session.current_url().await?;
        if !is_login_url(&url) {
            tracing::info!(
                "Logged in, profile saved to {}",
                config.browser.profile_dir.display()
            );
            return Ok(());
        }
        if Instant::now() >= deadline {
            anyhow::bail!(
                "Still on the login page after {}s",
                config.browser.login_timeout.as_secs()
            );
        }
    }
}

async fn status(config: Config) -> Result<ExitCode> {
    let store = StateStore::new(config.sync.state_file.clone());
    let state = store.load().await;

    println!("State file: {}", store.path().display());
    println!("Version:    {}", state.version);
    match state.updated_at {
        Some(at) => println!("Updated at: {}", at.to_rfc3339()),
        None => println!("Updated at: never"),
    }
    let without_page = state.notes.values().filter(|e| e.page_url.is_empty()).count();
    println!(
        "Notes:      {} ({} without a page URL)",
        state.len(),
        without_page
    );
    for entry in state.notes.values() {
        let synced = entry
            .last_synced_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("  {}  {}  {}", entry.source_id, synced, entry.title);
    }
    Ok(ExitCode::SUCCESS)
}
