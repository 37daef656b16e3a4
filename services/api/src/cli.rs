use crate::demo::{run_demo, run_legacy_import, DemoArgs, LegacyImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hostelcare::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Hostel Complaint Desk",
    about = "Run and demonstrate the hostel complaint desk from the command line",
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
    /// Work with exports from the previous complaint system
    Legacy {
        #[command(subcommand)]
        command: LegacyCommand,
    },
    /// Walk a complaint from filing to resolution against a seeded desk
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum LegacyCommand {
    /// Dry-run a legacy CSV import against the seeded desk and report the outcome
    Import(LegacyImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Legacy complaint export to import once the desk is seeded
    #[arg(long)]
    pub(crate) legacy_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Legacy {
            command: LegacyCommand::Import(args),
        } => run_legacy_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
