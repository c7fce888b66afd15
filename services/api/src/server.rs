use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionStore};
use crate::routes::with_triage_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use medassist::config::AppConfig;
use medassist::error::AppError;
use medassist::telemetry;
use medassist::triage::{DecisionClassifier, HttpScoringOracle, SimulatedBooker, TriageService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let oracle = Arc::new(HttpScoringOracle::from_config(&config.oracle)?);
    let booker = Arc::new(SimulatedBooker::new(config.booking.latency()));
    let triage_service = Arc::new(TriageService::new(
        Arc::new(InMemorySessionStore::default()),
        oracle,
        booker,
        DecisionClassifier::default(),
    ));

    let app = with_triage_routes(triage_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        oracle_model = %config.oracle.model,
        "medassist decision engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
