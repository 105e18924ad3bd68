use clap::{Parser, Subcommand};
use prepshark_core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "prepshark-cli", version, about = "PrepShark daily practice CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User registration and lookup
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Daily practice papers
    Paper {
        #[command(subcommand)]
        action: commands::paper::PaperAction,
    },
    /// Attempts, streaks and daily status
    Practice {
        #[command(subcommand)]
        action: commands::practice::PracticeAction,
    },
    /// Subscription plan catalog
    Plans {
        #[command(subcommand)]
        action: commands::plans::PlansAction,
    },
    /// Subscriptions and entitlements
    Subscription {
        #[command(subcommand)]
        action: commands::subscription::SubscriptionAction,
    },
    /// Question bank
    Questions {
        #[command(subcommand)]
        action: commands::questions::QuestionsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so stdout stays parseable JSON.
fn init_tracing() {
    let level = Config::load_or_default().logging.level;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::User { action } => commands::user::run(action),
        Commands::Paper { action } => commands::paper::run(action),
        Commands::Practice { action } => commands::practice::run(action),
        Commands::Plans { action } => commands::plans::run(action),
        Commands::Subscription { action } => commands::subscription::run(action),
        Commands::Questions { action } => commands::questions::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
