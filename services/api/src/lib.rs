mod cli;
mod infra;
mod report;
mod routes;
mod server;
mod users;

use skillcheck::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
