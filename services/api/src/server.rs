use crate::cli::ServeArgs;
use crate::infra::{seed_campus, AppState};
use crate::routes::with_note_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use note_encoding::config::AppConfig;
use note_encoding::error::AppError;
use note_encoding::telemetry;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let campus = seed_campus(config.encoding.clone(), Local::now().date_naive())
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

    let app = with_note_routes(campus.service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        academic_year = campus.academic_year,
        session = campus.session,
        "note encoding service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
