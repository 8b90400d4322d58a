use std::sync::Arc;

use chrono::{DateTime, Utc};
use habitdeck_core::events::timestamp;
use habitdeck_core::reminders::{Notifier, Permission};
use habitdeck_core::{Mode, ModeToggle, UnlockGate};
use serde::Serialize;

use crate::host::{print_json, CliResult, Host};

#[derive(Serialize)]
struct Status {
    locked: bool,
    expires_at: Option<DateTime<Utc>>,
    remaining_ms: u64,
    zen: bool,
    light_theme: bool,
    permission: Permission,
}

/// Read-only: restores nothing and never prompts.
pub fn run() -> CliResult {
    let host = Host::open()?;
    let gate = UnlockGate::new(Arc::clone(&host.db), Arc::clone(&host.clock))
        .with_duration_ms(host.config.unlock_duration_ms());
    let zen = ModeToggle::new(Mode::Focus, Arc::clone(&host.db));
    let theme = ModeToggle::new(Mode::Theme, Arc::clone(&host.db));

    let locked = gate.is_locked();
    print_json(&Status {
        locked,
        expires_at: gate.expiry_ms().filter(|_| !locked).map(timestamp),
        remaining_ms: gate.remaining_ms(),
        zen: zen.persisted().unwrap_or(false),
        light_theme: theme.persisted().unwrap_or(false),
        permission: host.notifier.permission(),
    });
    Ok(())
}
