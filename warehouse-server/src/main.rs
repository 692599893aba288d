use warehouse_server::core::BoxError;
use warehouse_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    print_banner();
    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        "Warehouse server starting"
    );

    let state = ServerState::initialize(config).await?;

    if let Err(e) = Server::new(state).run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
