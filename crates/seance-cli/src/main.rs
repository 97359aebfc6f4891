use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "seance", version, about = "Séance study timer CLI")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Auth(commands::auth::AuthAction),

    #[command(flatten)]
    Timer(commands::timer::TimerAction),

    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// List your séances
    Seances,
    /// Study statistics
    Stats {
        /// Ask the service to store a snapshot of the current figures
        #[arg(long)]
        save: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "seance=debug,seance_core=debug"
    } else {
        "seance=info,seance_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Auth(action) => commands::auth::run(action).await,
        Commands::Timer(action) => commands::timer::run(action).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Seances => commands::seances::run().await,
        Commands::Stats { save } => commands::stats::run(save).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
