use leadflow_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = leadflow_api::setup::initialize_app(config.clone()).await?;

    leadflow_api::setup::server::start_server(&config, state, router).await?;

    Ok(())
}
