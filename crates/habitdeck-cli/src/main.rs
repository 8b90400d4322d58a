use clap::{Parser, Subcommand};

mod commands;
mod host;
mod tracing_setup;

#[derive(Parser)]
#[command(name = "habitdeck", version, about = "Habitdeck engagement CLI")]
struct Cli {
    /// Debug logging on stderr (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print unlock, mode and permission state as JSON
    Status,
    /// Watch the ad and unlock the gated feature
    Unlock {
        /// Unlock immediately without the simulated ad
        #[arg(long)]
        skip_ad: bool,
    },
    /// Focus (zen) mode
    Zen {
        #[command(subcommand)]
        action: commands::mode::ModeAction,
    },
    /// Light/dark theme
    Theme {
        #[command(subcommand)]
        action: commands::mode::ModeAction,
    },
    /// Run the genie sequence through to navigation
    Genie,
    /// Simulate a click on a habit completion control
    Complete(commands::complete::CompleteArgs),
    /// Reminder polling and notification permission
    Reminders {
        #[command(subcommand)]
        action: commands::reminders::RemindersAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = tracing_setup::init_tracing(cli.debug) {
        eprintln!("warning: logging disabled: {e}");
    }

    let result = match cli.command {
        Commands::Status => commands::status::run(),
        Commands::Unlock { skip_ad } => commands::unlock::run(skip_ad),
        Commands::Zen { action } => commands::mode::run(habitdeck_core::Mode::Focus, action),
        Commands::Theme { action } => commands::mode::run(habitdeck_core::Mode::Theme, action),
        Commands::Genie => commands::genie::run(),
        Commands::Complete(args) => commands::complete::run(args),
        Commands::Reminders { action } => commands::reminders::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
