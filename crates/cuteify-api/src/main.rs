use cuteify_core::Config;

// Use mimalloc as the global allocator; the transforms allocate and free large
// pixel buffers concurrently.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, storage, routes)
    let (_state, router) = cuteify_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    cuteify_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
