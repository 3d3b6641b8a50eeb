mod cli;
mod demo;
mod infra;
mod routes;
mod score;
mod server;

use formsmith::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
