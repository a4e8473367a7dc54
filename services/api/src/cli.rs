use crate::commands::{run_alerts, run_score, AlertRunArgs, ScoreArgs};
use crate::server;
use aurora_watch::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Aurora Watch",
    about = "Score aurora viewing conditions and dispatch viewing alerts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single coordinate from explicit or live signals
    Score(ScoreArgs),
    /// Scheduled alert operations
    Alerts {
        #[command(subcommand)]
        command: AlertsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AlertsCommand {
    /// Execute one alert run against the seeded subscriptions and print the summary
    Run(AlertRunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args).await,
        Command::Alerts {
            command: AlertsCommand::Run(args),
        } => run_alerts(args).await,
    }
}
