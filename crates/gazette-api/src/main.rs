use gazette_core::Config;

// mimalloc keeps fragmentation low under many concurrent media buffers,
// especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = gazette_api::setup::initialize_app(config.clone()).await?;

    gazette_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
