mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use polls_cms::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
