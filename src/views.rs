use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Book, Series, SeriesForm, SeriesSearch, User};

/// Outcome
///
/// The result of every catalog handler: either a view-model for the rendering
/// collaborator or a redirect. Failures are never surfaced as error statuses.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(View),
    Redirect(String),
}

impl Outcome {
    pub fn redirect(path: impl Into<String>) -> Self {
        Outcome::Redirect(path.into())
    }

    /// The redirect target, if this outcome is a redirect.
    pub fn location(&self) -> Option<&str> {
        match self {
            Outcome::Redirect(path) => Some(path),
            Outcome::Render(_) => None,
        }
    }

    /// The rendered view, if this outcome is a render.
    pub fn view(&self) -> Option<&View> {
        match self {
            Outcome::Render(view) => Some(view),
            Outcome::Redirect(_) => None,
        }
    }
}

impl From<View> for Outcome {
    fn from(view: View) -> Self {
        Outcome::Render(view)
    }
}

/// Render => `200` with `{ "template": ..., "locals": ... }`; Redirect => `303 See Other`.
impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render(view) => (StatusCode::OK, Json(view)).into_response(),
            Outcome::Redirect(path) => Redirect::to(&path).into_response(),
        }
    }
}

/// View
///
/// The template to render, paired with its locals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "template", content = "locals")]
pub enum View {
    #[serde(rename = "index")]
    Index(IndexView),
    #[serde(rename = "series/index")]
    SeriesIndex(SeriesIndexView),
    #[serde(rename = "series/new")]
    SeriesNew(SeriesFormView),
    #[serde(rename = "series/show")]
    SeriesShow(SeriesShowView),
    #[serde(rename = "series/edit")]
    SeriesEdit(SeriesFormView),
}

// --- View-models ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct IndexView {
    pub signed_in: bool,
    pub is_admin: bool,
}

/// Locals for `series/index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SeriesIndexView {
    pub series: Vec<Series>,
    pub search_options: SeriesSearch,
}

/// Locals for `series/show`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SeriesShowView {
    pub user: User,
    pub series: Series,
    pub books: Vec<Book>,
}

/// Locals for `series/new` and `series/edit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SeriesFormView {
    pub series: SeriesDraft,
    pub notice: Option<Notice>,
}

/// SeriesDraft
///
/// What the form shows. `id` is `None` until the store has accepted the record,
/// and `access_level` stays a string so rejected input is echoed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SeriesDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub access_level: String,
}

impl SeriesDraft {
    /// The attempted values of a submission, attached to `id` when editing.
    pub fn attempted(id: Option<Uuid>, form: &SeriesForm) -> Self {
        Self {
            id,
            name: form.name.clone(),
            access_level: form.access_level.clone(),
        }
    }
}

impl From<&Series> for SeriesDraft {
    fn from(series: &Series) -> Self {
        Self {
            id: Some(series.id),
            name: series.name.clone(),
            access_level: series.access_level.to_string(),
        }
    }
}

/// Notice
///
/// A transient flash-style message shown once with the next rendered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NoticeKind {
    Info,
    Error,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}
