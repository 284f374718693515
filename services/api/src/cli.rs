use crate::report::{run_report, ReportArgs};
use crate::server;
use crate::users::{run_user_add, UserAddArgs};
use clap::{Args, Parser, Subcommand};
use skillcheck::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "skillcheck",
    about = "Data scientist skill checklist: serve the self-assessment API or print reports",
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
    /// Print a user's progress, radar values and level summary
    Report(ReportArgs),
    /// Manage login credentials
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user id with a password
    Add(UserAddArgs),
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
        Command::Report(args) => run_report(args),
        Command::User {
            command: UserCommand::Add(args),
        } => run_user_add(args),
    }
}
