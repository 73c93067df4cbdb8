//! Reminder Runner - scheduled due-date reminders for Taskflow
//!
//! Runs as a daemon: once at startup, then at the start of every hour, it
//! notifies assignees of open tasks due within the next 24 hours and raises
//! TASK_DUE_SOON for automations.
//!
//! Uses the same environment variables as the API server (see `config`) and
//! requires `DATABASE_URL`: the in-memory store would be private to this
//! process. Reminders are persisted only. This process has its own
//! notification hub, so open sockets on the API server do not receive them;
//! clients see them on their next notification fetch or reconnect.

use chrono::Utc;
use std::sync::Arc;
use taskflow::config::AppConfig;
use taskflow::services::email::EmailRelay;
use taskflow::state::AppState;
use tokio_cron_scheduler::{Job, JobScheduler};

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.shared_database_url() {
        log::error!("Reminder runner needs the shared database: {}", e);
        std::process::exit(1);
    }

    let (state, outbox) = match AppState::from_config(config.clone()) {
        Ok(built) => built,
        Err(e) => {
            log::error!("Failed to initialise storage: {}", e);
            std::process::exit(1);
        }
    };
    let state = Arc::new(state);

    // Reminders can fire SEND_EMAIL automations
    let relay = EmailRelay::new(config.email_relay_url.clone(), config.email_from.clone());
    tokio::spawn(relay.run(outbox));

    log::info!("Starting Taskflow reminder scheduler...");
    run_reminders(&state);

    if let Err(e) = schedule(state).await {
        log::error!("Scheduler failed: {}", e);
        std::process::exit(1);
    }

    // Keep the process running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
    }
}

async fn schedule(state: Arc<AppState>) -> Result<(), tokio_cron_scheduler::JobSchedulerError> {
    let sched = JobScheduler::new().await?;

    // Cron: "0 0 * * * *" = second 0, minute 0, every hour
    let reminder_job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
        let state = state.clone();
        Box::pin(async move {
            log::info!("Scheduled reminders triggered (hourly)");
            run_reminders(&state);
        })
    })?;
    sched.add(reminder_job).await?;
    sched.start().await?;

    log::info!("Reminder scheduler running: every hour at :00");
    Ok(())
}

fn run_reminders(state: &AppState) {
    match state.reminders.run(Utc::now().naive_utc()) {
        Ok(0) => log::info!("Reminders: nothing due in the next 24h"),
        Ok(count) => log::info!("Reminders: {} task(s) notified", count),
        Err(e) => log::error!("Reminder run failed: {}", e),
    }
}
