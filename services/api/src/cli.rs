use crate::commands::{run_preview, run_validate, PreviewArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use competency_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Competency Engine",
    about = "Validate competency item templates and preview how submissions score",
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
    /// Check a template file and list blocking errors and warnings
    Validate(ValidateArgs),
    /// Score a set of submission entries against a template file
    Preview(PreviewArgs),
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
        Command::Validate(args) => run_validate(args),
        Command::Preview(args) => run_preview(args),
    }
}
