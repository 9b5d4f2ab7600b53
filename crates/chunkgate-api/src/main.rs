use chunkgate_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (backends, services, routes)
    let (_state, router) = chunkgate_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    chunkgate_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
