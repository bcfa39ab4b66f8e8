use crate::demo::{run_demo, run_encode, DemoArgs, EncodeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use note_encoding::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Note Encoding",
    about = "Encode, submit and track exam notes from the command line",
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
    /// Encode a filled-in score sheet against the seeded data set
    Encode(EncodeArgs),
    /// Run an end-to-end CLI demo: encode, correct, submit and report progress
    Demo(DemoArgs),
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
        Command::Encode(args) => run_encode(args),
        Command::Demo(args) => run_demo(args),
    }
}
