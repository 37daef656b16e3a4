use crate::cli::ServeArgs;
use crate::infra::{seed_demo_desk, AppState, LoggingTransport};
use crate::routes::with_desk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hostelcare::complaints::legacy;
use hostelcare::config::AppConfig;
use hostelcare::error::AppError;
use hostelcare::notifications::QueuedNotifier;
use hostelcare::telemetry;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let transport = Arc::new(LoggingTransport::new(config.mail.from_address.clone()));
    let (notifier, mail_worker) = QueuedNotifier::spawn(transport);
    let seeded = seed_demo_desk(Arc::new(notifier), config.desk.clone())?;

    if let Some(path) = args.legacy_csv.take() {
        let records = legacy::parse_export(File::open(&path)?)?;
        let report = seeded
            .desk
            .import_legacy(&seeded.accounts.admin, records)?;
        info!(
            path = %path.display(),
            migrated = report.migrated.len(),
            skipped = report.skipped.len(),
            "legacy export imported"
        );
    }

    let app = with_desk_routes(seeded.desk)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_active_complaints = config.desk.max_active_complaints,
        "hostel complaint desk ready"
    );

    axum::serve(listener, app).await?;

    if let Err(err) = mail_worker.await {
        warn!(error = %err, "mail worker stopped abnormally");
    }
    Ok(())
}
