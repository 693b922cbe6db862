use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderName,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod views;

// Routing split by audience (public, series resource).
pub mod routes;
use routes::{public, series};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// Submissions larger than this are not read; the handler sees an empty
/// submission and renders the form again with an error notice.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// ApiDoc
///
/// OpenAPI document for the catalog routes and the view-model schemas handed to
/// the renderer. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index, handlers::list_series, handlers::new_series_form,
        handlers::create_series, handlers::show_series, handlers::edit_series_form,
        handlers::update_series, handlers::delete_series
    ),
    components(
        schemas(
            models::User, models::Series, models::Book, models::SeriesSearch,
            models::SeriesForm, views::IndexView, views::SeriesIndexView,
            views::SeriesShowView, views::SeriesFormView, views::SeriesDraft,
            views::Notice, views::NoticeKind,
        )
    ),
    tags(
        (name = "series-catalog", description = "Library series catalog")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of request-independent services. Nothing in it
/// is mutated by handlers; per-request state lives in the handlers themselves.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the `Repository` trait.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing table, applies the observability layers and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/series", series::series_routes())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Every request gets a UUID correlation id...
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // ...which the request span records...
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // ...and the response echoes back.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of one request carries the
/// same `req_id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
