use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryFormRepository, LoggingResultsNotifier};
use crate::routes::with_form_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use formsmith::config::AppConfig;
use formsmith::error::AppError;
use formsmith::forms::FormService;
use formsmith::telemetry;
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

    let repository = Arc::new(InMemoryFormRepository::default());
    let notifier = Arc::new(LoggingResultsNotifier::new(config.results.sender.clone()));
    let form_service = Arc::new(FormService::new(repository, notifier));

    let app = with_form_routes(form_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        results_delivery = config.results.sender.is_some(),
        "form builder service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
