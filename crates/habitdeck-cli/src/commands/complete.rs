use clap::{Args, ValueEnum};
use habitdeck_core::feedback::{CompletionState, CompletionToggled, Viewport};
use habitdeck_core::Config;

use crate::host::{print_events, runtime, CliResult, Host};

#[derive(Clone, Copy, ValueEnum)]
pub enum Prior {
    Incomplete,
    Complete,
}

#[derive(Args)]
pub struct CompleteArgs {
    /// Click x in CSS pixels
    #[arg(long)]
    x: f64,
    /// Click y in CSS pixels
    #[arg(long)]
    y: f64,
    /// State of the control before the click
    #[arg(long, value_enum, default_value = "incomplete")]
    prior: Prior,
    /// Habit id from the control's link
    #[arg(long)]
    habit: Option<i64>,
    /// Viewport width (defaults to feedback.viewport_width)
    #[arg(long)]
    width: Option<f64>,
    /// Viewport height (defaults to feedback.viewport_height)
    #[arg(long)]
    height: Option<f64>,
    /// Label text (defaults to feedback.label_text)
    #[arg(long)]
    text: Option<String>,
    /// Print the burst's particles as well
    #[arg(long)]
    particles: bool,
}

pub fn run(args: CompleteArgs) -> CliResult {
    let mut config = Config::load()?;
    if let Some(text) = args.text {
        config.feedback.label_text = text;
    }
    let viewport = Viewport::new(
        args.width.unwrap_or(config.feedback.viewport_width),
        args.height.unwrap_or(config.feedback.viewport_height),
    );

    let host = Host::with_config(config)?;
    let mut session = host.session();
    session.set_viewport(viewport);
    session.surface_mut().expand_bursts(args.particles);

    let prior = match args.prior {
        Prior::Incomplete => CompletionState::Incomplete,
        Prior::Complete => CompletionState::Complete,
    };
    session.on_completion(&CompletionToggled {
        habit_id: args.habit,
        prior,
        new: prior.flipped(),
        x: args.x,
        y: args.y,
    });
    // Label removal is scheduled.
    runtime()?.block_on(session.settle())?;

    print_events(&session.drain_events());
    Ok(())
}
