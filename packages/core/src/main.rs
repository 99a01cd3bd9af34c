use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;

use traffic_forecast::{
    api::{self, AppState},
    cli::Cli,
    config::Config,
    db,
    error::AppError,
    forecast::{load_model, types::FEATURE_COLUMNS, MinMaxScaler, Predictor, PredictorConfig, RecordStore},
    logging::init_logging,
    metrics::AppMetrics,
    repository::TrafficRepository,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(err) = run(Cli::parse()).await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = Config::from_env().map_err(AppError::Config)?;
    config.apply_cli(&cli);
    tracing::info!("Service starting with config: {:?}", config);

    // Artifacts are loaded once and shared read-only for the process lifetime.
    let scaler = MinMaxScaler::load(&config.scaler_path)?;
    if scaler.n_features() != FEATURE_COLUMNS.len() {
        return Err(AppError::Artifact(format!(
            "scaler has {} columns, expected {:?}",
            scaler.n_features(),
            FEATURE_COLUMNS
        )));
    }
    let model = load_model(&config.model_path)?;
    tracing::info!(
        "Loaded {} model ({} steps) and scaler from {} / {}",
        model.model_name(),
        model.window_len(),
        config.model_path.display(),
        config.scaler_path.display()
    );

    let pool = db::create_pool_with(&config.database_url, config.db_max_connections).await?;
    let store: Arc<dyn RecordStore + Send + Sync> = Arc::new(TrafficRepository::new(pool.clone()));

    let predictor = Predictor::new(
        store.clone(),
        Arc::new(scaler),
        model,
        PredictorConfig {
            fetch_limit: config.fetch_limit,
            ..PredictorConfig::default()
        },
    )?;

    let metrics = Arc::new(
        AppMetrics::new().map_err(|err| AppError::Config(format!("metrics registry: {}", err)))?,
    );

    let app = api::create_router(Arc::new(AppState {
        predictor: Arc::new(predictor),
        store,
        metrics,
        default_location: config.default_location.clone(),
        predict_timeout: config.predict_timeout,
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {}: {}", addr, err)))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Config(format!("server error: {}", err)))?;

    pool.close().await;
    tracing::info!("Server stopped cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
