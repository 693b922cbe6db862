use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Series Router Module
///
/// Mounted at `/series`. Preconditions per route:
///
/// | Route | Gate |
/// |---|---|
/// | `GET /` | signed in |
/// | `GET /new` | admin |
/// | `POST /` | none (admin when `guard_series_writes` is on) |
/// | `GET /{id}` | signed in + series visibility |
/// | `GET /{id}/edit` | admin |
/// | `PUT /{id}` | none (admin when `guard_series_writes` is on) |
/// | `DELETE /{id}` | admin |
pub fn series_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_series).post(handlers::create_series),
        )
        // The static segment takes priority over the `/{id}` capture.
        .route("/new", get(handlers::new_series_form))
        .route(
            "/{id}",
            get(handlers::show_series)
                .put(handlers::update_series)
                .delete(handlers::delete_series),
        )
        .route("/{id}/edit", get(handlers::edit_series_form))
}
