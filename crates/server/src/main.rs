//! GAD portal server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use gad_api::{SseBroadcaster, middleware::AppState, router as api_router};
use gad_common::Config;
use gad_core::{
    AcademicPeriodService, AccountService, ActivityLogService, DashboardService, EmployeeService,
    EventPublisherService, EventService, ImportService, NewsService, NotificationService,
    ParticipantService, scheduler::spawn_archive_scheduler,
};
use gad_db::repositories::{
    AcademicPeriodRepository, ActivityLogRepository, EmployeeRepository, EventRepository,
    NewsRepository, NotificationRepository, ParticipantRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Seconds between sweeps of abandoned per-user SSE channels.
const SSE_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gad=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting GAD portal server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = gad_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    gad_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let period_repo = AcademicPeriodRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let participant_repo = ParticipantRepository::new(Arc::clone(&db));
    let employee_repo = EmployeeRepository::new(Arc::clone(&db));
    let news_repo = NewsRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let activity_log_repo = ActivityLogRepository::new(Arc::clone(&db));

    // Realtime fan-out shared by every service
    let sse_broadcaster = SseBroadcaster::new();
    let publisher: EventPublisherService = Arc::new(sse_broadcaster.clone());

    // Initialize services. The notification service is wired to the
    // publisher before it is cloned into the services that notify.
    let activity_log_service = ActivityLogService::new(activity_log_repo);

    let mut notification_service =
        NotificationService::new(notification_repo.clone(), user_repo.clone());
    notification_service.set_event_publisher(publisher.clone());

    let account_service = AccountService::new(
        user_repo.clone(),
        notification_service.clone(),
        activity_log_service.clone(),
    );

    let mut period_service = AcademicPeriodService::new(
        period_repo.clone(),
        activity_log_service.clone(),
        notification_service.clone(),
    );
    period_service.set_event_publisher(publisher.clone());

    let mut event_service = EventService::new(
        event_repo.clone(),
        period_repo.clone(),
        activity_log_service.clone(),
    );
    event_service.set_event_publisher(publisher.clone());

    let mut participant_service = ParticipantService::new(
        participant_repo.clone(),
        event_repo.clone(),
        activity_log_service.clone(),
    );
    participant_service.set_event_publisher(publisher.clone());

    let mut employee_service = EmployeeService::new(
        employee_repo.clone(),
        period_repo.clone(),
        activity_log_service.clone(),
    );
    employee_service.set_event_publisher(publisher.clone());

    let mut news_service = NewsService::new(news_repo, activity_log_service.clone());
    news_service.set_event_publisher(publisher.clone());

    let mut import_service = ImportService::new(
        participant_repo.clone(),
        employee_repo.clone(),
        event_repo.clone(),
        activity_log_service.clone(),
        notification_service.clone(),
        config.import.clone(),
    );
    import_service.set_event_publisher(publisher);

    let dashboard_service = DashboardService::new(
        period_repo,
        event_repo,
        participant_repo,
        employee_repo,
        user_repo,
        notification_repo,
    );

    // Bootstrap administrator
    if let Some(bootstrap) = &config.bootstrap {
        match account_service.ensure_bootstrap_admin(bootstrap).await {
            Ok(Some(admin)) => info!(username = %admin.username, "Created bootstrap administrator"),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Failed to create bootstrap administrator"),
        }
    }

    // Background jobs
    let archive_job = spawn_archive_scheduler(period_service.clone(), config.scheduler.clone());
    info!(
        interval_secs = config.scheduler.archive_interval_secs,
        timezone = %config.scheduler.timezone,
        "Academic period archival scheduler started"
    );

    let cleanup_broadcaster = sse_broadcaster.clone();
    let cleanup_job = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SSE_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            cleanup_broadcaster.cleanup().await;
        }
    });

    // Create app state
    let state = AppState {
        account_service,
        period_service,
        event_service,
        participant_service,
        employee_service,
        news_service,
        notification_service,
        activity_log_service,
        import_service,
        dashboard_service,
        sse_broadcaster,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gad_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    archive_job.abort();
    cleanup_job.abort();

    info!("Server shutdown complete");
    Ok(())
}
