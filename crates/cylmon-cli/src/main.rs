mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use settings::ConfigArgs;

#[derive(Parser)]
#[command(
    name = "cylmon",
    about = "Watch pneumatic cylinder positions reconciled from their proximity sensors",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    settings: ConfigArgs,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the sensors and serve the position feed over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Poll the sensors and print every update until Ctrl-C
    Watch,

    /// Inspect, validate or create the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Watch => tracing::Level::INFO,
        Commands::Config { .. } => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve { port } => cli
            .settings
            .load()
            .and_then(|config| cmd::serve::run(config, port)),
        Commands::Watch => cli
            .settings
            .load()
            .and_then(|config| cmd::watch::run(config, cli.json)),
        Commands::Config { subcommand } => cmd::config::run(&cli.settings, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
