mod check;
mod cli;
mod infra;
mod routes;
mod server;

use evaluation_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
