use std::sync::Arc;
use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use habitdeck_core::reminders::{
    enable_reminders, HttpReminderSource, Notifier, Permission, PollOutcome, ReminderPoller,
};
use serde_json::json;
use tokio::sync::mpsc;

use crate::host::{print_json, runtime, CliResult, Host};

#[derive(Clone, Copy, ValueEnum)]
pub enum PermissionArg {
    Granted,
    Denied,
    Unknown,
}

impl From<PermissionArg> for Permission {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Granted => Permission::Granted,
            PermissionArg::Denied => Permission::Denied,
            PermissionArg::Unknown => Permission::Unknown,
        }
    }
}

#[derive(Subcommand)]
pub enum RemindersAction {
    /// Check the reminder source once
    Poll {
        /// Source base URL (defaults to reminders.base_url)
        #[arg(long)]
        url: Option<String>,
    },
    /// Poll on an interval until interrupted
    Watch {
        #[arg(long)]
        url: Option<String>,
        /// Seconds between polls (defaults to reminders.interval_secs)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many delivered or failed polls
        #[arg(long)]
        count: Option<usize>,
    },
    /// Request permission and confirm with a notification
    Enable,
    /// Show or override the stored notification permission
    Permission {
        #[arg(long, value_enum)]
        set: Option<PermissionArg>,
    },
}

pub fn run(action: RemindersAction) -> CliResult {
    let host = Host::open()?;
    match action {
        RemindersAction::Poll { url } => {
            let base = url.unwrap_or_else(|| host.config.reminders.base_url.clone());
            let poller = poller(&host, &base, HttpReminderSource::REQUEST_TIMEOUT)?;
            let outcome = runtime()?.block_on(poller.poll_once());
            let line = match outcome {
                PollOutcome::Skipped => json!({ "outcome": "skipped" }),
                PollOutcome::Quiet => json!({ "outcome": "quiet" }),
                PollOutcome::Delivered(message) => {
                    json!({ "outcome": "delivered", "message": message })
                }
                PollOutcome::Failed(error) => json!({ "outcome": "failed", "error": error }),
            };
            print_json(&line);
        }
        RemindersAction::Watch {
            url,
            interval,
            count,
        } => {
            if !host.config.reminders.enabled {
                return Err("reminders are disabled (reminders.enabled = false)".into());
            }
            let base = url.unwrap_or_else(|| host.config.reminders.base_url.clone());
            let secs = interval.unwrap_or(host.config.reminders.interval_secs).max(1);
            let period = Duration::from_secs(secs);
            let timeout = period.min(HttpReminderSource::REQUEST_TIMEOUT);
            let poller = poller(&host, &base, timeout)?.with_interval(period);
            runtime()?.block_on(watch(poller, count))?;
        }
        RemindersAction::Enable => {
            let permission = enable_reminders(host.notifier.as_ref());
            print_json(&json!({ "permission": permission }));
        }
        RemindersAction::Permission { set } => {
            if let Some(permission) = set {
                host.notifier.set_permission(permission.into())?;
            }
            print_json(&json!({ "permission": host.notifier.permission() }));
        }
    }
    Ok(())
}

fn poller(host: &Host, base_url: &str, timeout: Duration) -> CliResult<ReminderPoller> {
    let source = Arc::new(HttpReminderSource::with_timeout(base_url, timeout)?);
    let notifier: Arc<dyn Notifier> = host.notifier.clone();
    Ok(ReminderPoller::new(source, notifier, Arc::clone(&host.clock)))
}

async fn watch(poller: ReminderPoller, count: Option<usize>) -> CliResult {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = poller.spawn(Some(tx));
    let mut seen = 0usize;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    print_json(&event);
                    seen += 1;
                    if count.is_some_and(|limit| seen >= limit) {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.join().await;
    Ok(())
}
