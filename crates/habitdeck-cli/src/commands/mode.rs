use std::sync::Arc;

use clap::Subcommand;
use habitdeck_core::{Mode, ModeToggle};
use serde::Serialize;

use crate::host::{print_events, print_json, CliResult, Host};

#[derive(Subcommand)]
pub enum ModeAction {
    /// Flip the mode and persist it
    Toggle,
    /// Print whether the mode is on
    Status,
}

#[derive(Serialize)]
struct ModeStatus {
    mode: Mode,
    on: bool,
}

pub fn run(mode: Mode, action: ModeAction) -> CliResult {
    let host = Host::open()?;
    match action {
        ModeAction::Toggle => {
            let mut session = host.session();
            match mode {
                Mode::Focus => session.toggle_zen()?,
                Mode::Theme => session.toggle_theme()?,
            };
            print_events(&session.drain_events());
        }
        ModeAction::Status => {
            let toggle = ModeToggle::new(mode, Arc::clone(&host.db));
            print_json(&ModeStatus {
                mode,
                on: toggle.persisted().unwrap_or(false),
            });
        }
    }
    Ok(())
}
