use std::error::Error;

use blog_backend::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::Repositories,
    shutdown::shutdown_signal,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, connects and migrates the database,
/// then serves HTTP until Ctrl-C or SIGTERM.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 1. Configuration (fail fast on missing DATABASE_URL, or JWT_SECRET in production)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging: RUST_LOG wins, otherwise crate-level debug.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_backend=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.uses_default_jwt_secret() {
        tracing::warn!("JWT_SECRET is not set; signing tokens with the built-in development secret");
    }

    // 3. Database
    let pool = config
        .database
        .pool_options()
        .connect(&config.db_url)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to connect to Postgres"))?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    // 4. State and router
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(Repositories::postgres(pool.clone()), config));

    // 5. Serve
    let listener = TcpListener::bind(&bind_addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Listening on {local_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{local_addr}/swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}
