use school_portal::{app, bootstrap, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "school_portal=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        store = ?config.store,
        db_url_set = config.database.url.is_some(),
        db_host = %config.database.host,
        db_user = %config.database.user,
        db_name = %config.database.name,
        "environment"
    );

    let app_state = AppState::init(config)?;

    // Listen right away; requests that arrive before bootstrap finishes may fail.
    tokio::spawn(bootstrap::run(app_state.clone()));

    let listener = app::bind(&app_state.config).await?;
    let router = app::build_app(app_state)?;
    app::serve(listener, router).await
}
