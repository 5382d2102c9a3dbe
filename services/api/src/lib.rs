mod cli;
mod infra;
mod routes;
mod server;

use ip_filing::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
