use crate::cli::ServeArgs;
use crate::infra::{dispatch_settings, load_seed, AppState, InMemorySubscriptionStore};
use crate::routes::with_application_routes;
use aurora_watch::alerts::{AlertRunService, ResendEmailSink};
use aurora_watch::config::AppConfig;
use aurora_watch::error::AppError;
use aurora_watch::providers::SignalProviders;
use aurora_watch::scoring::ScoringEngine;
use aurora_watch::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let engine = Arc::new(ScoringEngine::new(config.scoring.moon_model()));
    let providers = SignalProviders::from_config(&config.providers)?;
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine: engine.clone(),
        providers: providers.clone(),
    };

    let seed = load_seed(config.alerts.seed_path.as_deref().map(Path::new))?;
    info!(
        locations = seed.locations.len(),
        saved_locations = seed.saved_locations.len(),
        "subscription store seeded"
    );
    let store = Arc::new(InMemorySubscriptionStore::from_seed(seed));
    let notifier = Arc::new(ResendEmailSink::from_config(&config.alerts)?);
    if config.alerts.cron_secret.is_none() {
        warn!("CRON_SECRET is not set; alert runs will be rejected");
    }
    let alert_service = Arc::new(AlertRunService::new(
        store,
        notifier,
        providers,
        engine,
        dispatch_settings(&config),
    ));

    let app = with_application_routes(alert_service, config.alerts.cron_secret.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "aurora watch service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
