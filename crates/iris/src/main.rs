mod application_config;
mod cli;
mod job_tracker;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::initialize_logging()?;
    logging::initialize_panic_handler()?;

    tracing::debug!("starting iris");

    cli::run().await?;

    Ok(())
}
