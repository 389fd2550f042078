use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

use reminder_core::app::{CoordinatorBuilder, ReminderConfig, ReminderCoordinator};
use reminder_core::domain::{BatchSummary, Priority, TaskItem, UserId};
use reminder_core::impls::{
    InMemoryTaskStore, InMemoryUserDirectory, LogTransport, MailNotifier, MailTransport,
    ReminderEmail, TransportError, UserRecord,
};
use reminder_core::ports::{Clock, Notifier, SystemClock};

/// Trigger reminder batches against a seeded in-memory backend.
#[derive(Parser)]
#[command(name = "reminder-cli")]
struct Cli {
    /// JSON config file (worker_timeout_secs, max_in_flight, reminder_horizon_hours).
    #[arg(long, env = "REMINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Number of batches to trigger.
    #[arg(long, default_value_t = 1)]
    runs: u32,

    /// Seconds between batches when --runs > 1.
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    /// Number of demo users to seed.
    #[arg(long, default_value_t = 12)]
    users: u32,

    /// Write reminder mails to the log instead of the demo transport.
    #[arg(long)]
    log_only: bool,

    /// Log at debug level (RUST_LOG still wins).
    #[arg(long)]
    verbose: bool,
}

/// Transport that bounces every address under `bounce.example`.
struct DemoTransport;

#[async_trait]
impl MailTransport for DemoTransport {
    async fn deliver(&self, email: &ReminderEmail) -> Result<(), TransportError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if email.to.ends_with("@bounce.example") {
            return Err(TransportError::Rejected(email.to.clone()));
        }
        tracing::info!(to = %email.to, subject = %email.subject, "reminder mail sent");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "reminder_core=debug,reminder_cli=debug"
        } else {
            "reminder_core=info,reminder_cli=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = load_config(cli.config.as_ref())?;
    tracing::info!(?config, "configuration loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let directory = Arc::new(InMemoryUserDirectory::new());
    let store = Arc::new(
        InMemoryTaskStore::new(Arc::clone(&clock)).with_horizon(config.reminder_horizon()),
    );
    seed(&directory, &store, cli.users).await;

    let notifier: Arc<dyn Notifier> = if cli.log_only {
        Arc::new(MailNotifier::new(LogTransport))
    } else {
        Arc::new(MailNotifier::new(DemoTransport))
    };

    let coordinator = CoordinatorBuilder::new()
        .user_directory(directory)
        .task_provider(store)
        .notifier(notifier)
        .clock(clock)
        .config(config)
        .build()?;

    let runs = cli.runs.max(1);
    for run in 1..=runs {
        tokio::select! {
            result = run_once(&coordinator) => {
                let summary = result?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                for failure in coordinator.failures().await {
                    tracing::warn!(
                        user_id = %failure.user_id,
                        email = %failure.email,
                        kind = ?failure.kind,
                        message = %failure.message,
                        "reminder failed"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(run, "interrupted; stopping");
                break;
            }
        }

        if run < runs {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(cli.interval_secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(run, "interrupted; stopping");
                    break;
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<ReminderConfig> {
    let base = match path {
        Some(path) => ReminderConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReminderConfig::default(),
    };
    Ok(base.apply_env_overrides(|key| std::env::var(key).ok())?)
}

/// Run one batch, logging progress every second until it completes.
async fn run_once(coordinator: &ReminderCoordinator) -> Result<BatchSummary> {
    let started = coordinator.run_batch().await?;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;

    let wait = coordinator.wait_for_completion(started.batch_id);
    tokio::pin!(wait);
    loop {
        tokio::select! {
            summary = &mut wait => {
                return summary.context("completion channel closed");
            }
            _ = ticker.tick() => {
                let progress = coordinator.progress().await;
                tracing::info!(
                    batch_id = %started.batch_id,
                    completed = progress.completed,
                    total = progress.total,
                    active = progress.active_workers,
                    "batch progress"
                );
            }
        }
    }
}

async fn seed(directory: &InMemoryUserDirectory, store: &InMemoryTaskStore, users: u32) {
    let now = Utc::now();
    let mut next_task_id = 1u64;

    for n in 0..users {
        let id = UserId::from_ulid(Ulid::new());
        let email = if n % 7 == 6 {
            format!("user{n}@bounce.example")
        } else {
            format!("user{n}@example.com")
        };
        directory.add_user(UserRecord::new(id, email)).await;

        if n % 5 == 4 {
            store.break_user(id, "task query timed out").await;
            continue;
        }

        for k in 0..(n % 3) {
            let priority = match k {
                0 => Priority::High,
                _ => Priority::Medium,
            };
            store
                .insert(
                    TaskItem::new(next_task_id, id, format!("task {k} for user {n}"))
                        .with_priority(priority)
                        .due(now + chrono::Duration::hours(i64::from(k + 1) * 6)),
                )
                .await;
            next_task_id += 1;
        }
    }
}
