use crate::{
    AppState,
    auth::CurrentUser,
    gate::{self, ADMIN_ONLY, ROOT_PATH, SERIES_PATH, SIGNED_IN},
    models::{SeriesForm, SeriesSearch},
    repository::RepoError,
    views::{
        IndexView, Notice, Outcome, SeriesDraft, SeriesFormView, SeriesIndexView, SeriesShowView,
        View,
    },
};
use axum::{
    Form, Json,
    extract::{FromRequest, Path, Query, Request, State},
    http::header,
};
use std::convert::Infallible;
use uuid::Uuid;

/// Every catalog handler answers with an `Outcome` on both arms; the `Err` arm
/// carries the short-circuit of a gate or an early failure.
pub type Reply = Result<Outcome, Outcome>;

const SAVED: &str = "Series saved!";
const CREATE_FAILED: &str = "Error creating series";
const UPDATE_FAILED: &str = "Error updating series";

fn show_path(id: Uuid) -> String {
    format!("{SERIES_PATH}/{id}")
}

/// Path ids that are not UUIDs cannot name a record; they take the not-found branch.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

// --- Extractors ---

/// SeriesBody
///
/// The create/update submission, read as JSON when the request says
/// `application/json` and as an urlencoded form otherwise. A body that cannot
/// be decoded (wrong shape, over the size limit) becomes an empty submission,
/// which then fails validation like any other bad input.
#[derive(Debug, Clone, Default)]
pub struct SeriesBody(pub SeriesForm);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("application/json"))
}

impl<S> FromRequest<S> for SeriesBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let decoded = if is_json(&req) {
            Json::<SeriesForm>::from_request(req, state)
                .await
                .map(|Json(form)| form)
                .map_err(|e| e.body_text())
        } else {
            Form::<SeriesForm>::from_request(req, state)
                .await
                .map(|Form(form)| form)
                .map_err(|e| e.body_text())
        };

        Ok(SeriesBody(decoded.unwrap_or_else(|error| {
            tracing::warn!(%error, "unreadable series submission");
            SeriesForm::default()
        })))
    }
}

// --- Handlers ---

/// index
///
/// The application root. Every fail-safe redirect lands here.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Index view", body = IndexView))
)]
pub async fn index(CurrentUser(user): CurrentUser) -> Outcome {
    View::Index(IndexView {
        signed_in: user.is_some(),
        is_admin: user.as_ref().is_some_and(|u| u.is_admin()),
    })
    .into()
}

/// list_series
///
/// [Signed in] Series the reader may see, optionally narrowed by a name
/// substring, sorted by name. A store failure sends the reader to the root.
#[utoipa::path(
    get,
    path = "/series",
    params(SeriesSearch),
    responses(
        (status = 200, description = "series/index view", body = SeriesIndexView),
        (status = 303, description = "Not signed in, or the listing failed")
    )
)]
pub async fn list_series(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(search): Query<SeriesSearch>,
) -> Reply {
    let user = gate::authorize(current, SIGNED_IN)?;

    match state
        .repo
        .list_series(user.access_level, search.name_filter())
        .await
    {
        Ok(series) => Ok(View::SeriesIndex(SeriesIndexView {
            series,
            search_options: search,
        })
        .into()),
        Err(e) => {
            tracing::error!(error = %e, "listing series failed");
            Err(Outcome::redirect(ROOT_PATH))
        }
    }
}

/// new_series_form
///
/// [Admin] An empty creation form. Nothing is persisted.
#[utoipa::path(
    get,
    path = "/series/new",
    responses(
        (status = 200, description = "series/new view", body = SeriesFormView),
        (status = 303, description = "Not an administrator")
    )
)]
pub async fn new_series_form(current: CurrentUser) -> Reply {
    gate::authorize(current, ADMIN_ONLY)?;
    Ok(View::SeriesNew(SeriesFormView::default()).into())
}

/// create_series
///
/// Persists a series from the submitted `name` and `accessLevel`, then renders
/// the creation form again: with the stored record and an info notice on
/// success, with the attempted values and an error notice on failure.
///
/// No gate applies unless `guard_series_writes` is switched on.
#[utoipa::path(
    post,
    path = "/series",
    request_body(content(
        (SeriesForm = "application/x-www-form-urlencoded"),
        (SeriesForm = "application/json")
    )),
    responses(
        (status = 200, description = "series/new view with a notice", body = SeriesFormView)
    )
)]
pub async fn create_series(
    current: CurrentUser,
    State(state): State<AppState>,
    SeriesBody(form): SeriesBody,
) -> Reply {
    if state.config.guard_series_writes {
        gate::authorize(current, ADMIN_ONLY)?;
    }

    let saved = match form.parse() {
        Ok(input) => state.repo.create_series(input).await.map_err(|e| e.to_string()),
        Err(reason) => Err(reason),
    };

    let view = match saved {
        Ok(series) => {
            tracing::info!(series_id = %series.id, name = %series.name, "series created");
            SeriesFormView {
                series: SeriesDraft::from(&series),
                notice: Some(Notice::info(SAVED)),
            }
        }
        Err(reason) => {
            tracing::warn!(%reason, "series creation failed");
            SeriesFormView {
                series: SeriesDraft::attempted(None, &form),
                notice: Some(Notice::error(CREATE_FAILED)),
            }
        }
    };
    Ok(View::SeriesNew(view).into())
}

/// show_series
///
/// [Signed in + visibility] The series with the reader's record and the books
/// of the series the reader may see, in series order. Any failure after the
/// gate sends the reader to the root.
#[utoipa::path(
    get,
    path = "/series/{id}",
    params(("id" = Uuid, Path, description = "Series ID")),
    responses(
        (status = 200, description = "series/show view", body = SeriesShowView),
        (status = 303, description = "Hidden, missing, or failed")
    )
)]
pub async fn show_series(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply {
    let viewer = gate::authorize(current, SIGNED_IN)?;
    let id = parse_id(&id).ok_or_else(|| Outcome::redirect(SERIES_PATH))?;
    let series = gate::visible_series(&state.repo, &viewer, id).await?;

    let user = state.repo.get_user(viewer.id).await.map_err(|e| {
        tracing::error!(user_id = %viewer.id, error = %e, "loading reader failed");
        Outcome::redirect(ROOT_PATH)
    })?;
    let books = state
        .repo
        .get_books_in_series(series.id, viewer.access_level)
        .await
        .map_err(|e| {
            tracing::error!(series_id = %series.id, error = %e, "loading books failed");
            Outcome::redirect(ROOT_PATH)
        })?;

    Ok(View::SeriesShow(SeriesShowView {
        user,
        series,
        books,
    })
    .into())
}

/// edit_series_form
///
/// [Admin] The edit form for an existing series; a missing one goes back to the listing.
#[utoipa::path(
    get,
    path = "/series/{id}/edit",
    params(("id" = Uuid, Path, description = "Series ID")),
    responses(
        (status = 200, description = "series/edit view", body = SeriesFormView),
        (status = 303, description = "Not an administrator, or missing")
    )
)]
pub async fn edit_series_form(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply {
    gate::authorize(current, ADMIN_ONLY)?;
    let id = parse_id(&id).ok_or_else(|| Outcome::redirect(SERIES_PATH))?;

    match state.repo.get_series(id).await {
        Ok(series) => Ok(View::SeriesEdit(SeriesFormView {
            series: SeriesDraft::from(&series),
            notice: None,
        })
        .into()),
        Err(e) => {
            tracing::warn!(series_id = %id, error = %e, "edit form for unknown series");
            Err(Outcome::redirect(SERIES_PATH))
        }
    }
}

/// update_series
///
/// Overwrites name and access level of the fetched series. If the fetch fails
/// the reader goes to the root; if the write fails the edit form is rendered
/// again with the attempted values, and the stored record stays as it was.
///
/// No gate applies unless `guard_series_writes` is switched on.
#[utoipa::path(
    put,
    path = "/series/{id}",
    params(("id" = Uuid, Path, description = "Series ID")),
    request_body(content(
        (SeriesForm = "application/x-www-form-urlencoded"),
        (SeriesForm = "application/json")
    )),
    responses(
        (status = 200, description = "series/edit view with an error notice", body = SeriesFormView),
        (status = 303, description = "Updated, or missing")
    )
)]
pub async fn update_series(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    SeriesBody(form): SeriesBody,
) -> Reply {
    if state.config.guard_series_writes {
        gate::authorize(current, ADMIN_ONLY)?;
    }
    let id = parse_id(&id).ok_or_else(|| Outcome::redirect(ROOT_PATH))?;

    let mut series = state.repo.get_series(id).await.map_err(|e| {
        tracing::warn!(series_id = %id, error = %e, "update of unknown series");
        Outcome::redirect(ROOT_PATH)
    })?;

    let saved = match form.parse() {
        Ok(input) => {
            series.apply(input);
            state.repo.update_series(&series).await.map_err(|e| e.to_string())
        }
        Err(reason) => Err(reason),
    };

    match saved {
        Ok(series) => {
            tracing::info!(series_id = %series.id, "series updated");
            Ok(Outcome::redirect(show_path(series.id)))
        }
        Err(reason) => {
            tracing::warn!(series_id = %id, %reason, "series update failed");
            Ok(View::SeriesEdit(SeriesFormView {
                series: SeriesDraft::attempted(Some(series.id), &form),
                notice: Some(Notice::error(UPDATE_FAILED)),
            })
            .into())
        }
    }
}

/// delete_series
///
/// [Admin] Removes the series; its books keep their dangling reference.
/// A series that cannot be fetched sends the admin to the root; a failed
/// delete leaves the record in place, so the admin is shown it again.
#[utoipa::path(
    delete,
    path = "/series/{id}",
    params(("id" = Uuid, Path, description = "Series ID")),
    responses((status = 303, description = "Deleted, missing, or failed"))
)]
pub async fn delete_series(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply {
    gate::authorize(current, ADMIN_ONLY)?;
    let id = parse_id(&id).ok_or_else(|| Outcome::redirect(ROOT_PATH))?;

    let series = state.repo.get_series(id).await.map_err(|e| {
        tracing::warn!(series_id = %id, error = %e, "delete of unknown series");
        Outcome::redirect(ROOT_PATH)
    })?;

    match state.repo.delete_series(series.id).await {
        Ok(()) => {
            tracing::info!(series_id = %series.id, "series deleted");
            Ok(Outcome::redirect(SERIES_PATH))
        }
        // Removed by another request since the fetch; the outcome is the same.
        Err(RepoError::NotFound) => {
            tracing::info!(series_id = %series.id, "series already deleted");
            Ok(Outcome::redirect(SERIES_PATH))
        }
        Err(e) => {
            tracing::error!(series_id = %series.id, error = %e, "series delete failed");
            Err(Outcome::redirect(show_path(series.id)))
        }
    }
}
