//! # Server Configuration
//!
//! This module contains the server setup and configuration for the
//! Scheduling API: shared state, the router with its middleware stack, and
//! the serve loop with graceful shutdown.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::AppConfig;
use crate::handlers;
use crate::meetings::{MeetingProvider, ZoomMeetingClient};
use crate::scheduling::BookingService;
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub booking: Arc<BookingService>,
}

/// Builds application state from explicit collaborators.
pub fn build_state(
    config: AppConfig,
    db: DatabaseConnection,
    meetings: Arc<dyn MeetingProvider>,
) -> AppState {
    let db = Arc::new(db);
    let config = Arc::new(config);
    let booking = Arc::new(BookingService::new(db.clone(), meetings, &config));

    AppState {
        db,
        config,
        booking,
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/availability",
            put(handlers::availability::replace_availability),
        )
        .route(
            "/availability/{provider_id}/slots",
            get(handlers::availability::list_open_slots),
        )
        .route(
            "/scheduling/group-sessions",
            post(handlers::sessions::create_group_session)
                .get(handlers::sessions::list_open_group_sessions),
        )
        .route(
            "/scheduling/bookings",
            post(handlers::sessions::book_session),
        )
        .route(
            "/scheduling/enrollments",
            post(handlers::sessions::enroll_group_session),
        )
        .route(
            "/scheduling/me/sessions",
            get(handlers::sessions::my_sessions),
        )
        .layer(middleware::from_fn(auth::auth_middleware));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let meetings: Arc<dyn MeetingProvider> = Arc::new(
        ZoomMeetingClient::new(config.zoom.clone())
            .map_err(|e| format!("Failed to build meeting client: {}", e))?,
    );

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = build_state(config, db, meetings);
    let app = create_app(state);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::availability::replace_availability,
        crate::handlers::availability::list_open_slots,
        crate::handlers::sessions::create_group_session,
        crate::handlers::sessions::list_open_group_sessions,
        crate::handlers::sessions::book_session,
        crate::handlers::sessions::enroll_group_session,
        crate::handlers::sessions::my_sessions,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::handlers::availability::AvailabilitySlotDto,
            crate::handlers::availability::ReplaceAvailabilityRequestDto,
            crate::handlers::availability::SuccessResponseDto,
            crate::handlers::sessions::CreateGroupSessionDto,
            crate::handlers::sessions::BookSessionDto,
            crate::handlers::sessions::EnrollGroupSessionDto,
            crate::scheduling::SlotView,
            crate::scheduling::SessionView,
            crate::models::scheduled_session::SessionType,
            crate::models::scheduled_session::SessionStatus,
            crate::scheduling::EnrollmentResult,
            crate::error::ApiError,
            crate::error::VendorError,
        )
    ),
    info(
        title = "Tutora Scheduling API",
        description = "API for tutoring availability, booking and group session enrollment",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
