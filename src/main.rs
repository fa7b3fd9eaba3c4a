use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_core::CoreConfig;
use triage_core::config::{data_dir_from_env_value, ruleset_from_env_values};

/// Settings read from the environment at startup.
#[derive(Debug)]
struct Settings {
    rest_addr: String,
    api_key: String,
    cfg: CoreConfig,
}

/// Resolve startup settings from a variable lookup.
///
/// # Environment Variables
/// - `TRIAGE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `API_KEY`: shared key every request except `/health` must present (required)
/// - `TRIAGE_DATA_DIR`: directory for the case journal (unset: in-memory only)
/// - `TRIAGE_RULESET`: built-in ruleset version (default: "v3")
/// - `TRIAGE_RULESET_FILE`: YAML ruleset file; takes precedence over `TRIAGE_RULESET`
fn settings_from(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Settings> {
    let rest_addr = var("TRIAGE_REST_ADDR")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "0.0.0.0:3000".into());

    let api_key = var("API_KEY").unwrap_or_default();
    if api_key.trim().is_empty() {
        anyhow::bail!("API_KEY must be set");
    }

    let ruleset = ruleset_from_env_values(var("TRIAGE_RULESET"), var("TRIAGE_RULESET_FILE"))?;
    let cfg = CoreConfig::new(data_dir_from_env_value(var("TRIAGE_DATA_DIR")), ruleset)?;

    Ok(Settings {
        rest_addr,
        api_key,
        cfg,
    })
}

/// Main entry point for the triage service
///
/// Loads `.env`, resolves configuration once, replays the case journal (when a data directory
/// is configured) and serves the REST API until Ctrl-C.
///
/// # Errors
/// Returns an error if:
/// - `API_KEY` is missing,
/// - the ruleset cannot be loaded or the case journal cannot be replayed, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage_run=info".parse()?)
                .add_directive("triage_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = settings_from(|name| std::env::var(name).ok())?;

    tracing::info!(
        "++ Ruleset {} ({})",
        settings.cfg.ruleset().version(),
        settings.cfg.ruleset().provenance()
    );
    match settings.cfg.data_dir() {
        Some(dir) => tracing::info!("++ Case journal in {}", dir.display()),
        None => tracing::info!("++ Cases held in memory"),
    }

    let service = settings.cfg.build_service()?;
    let app = api_rest::router(api_rest::AppState::new(service, settings.api_key));

    tracing::info!("++ Starting triage REST on {}", settings.rest_addr);
    let listener = tokio::net::TcpListener::bind(&settings.rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}
