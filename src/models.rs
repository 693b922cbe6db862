use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// The role string that grants administrator rights.
pub const ADMIN_ROLE: &str = "admin";

// --- Core Catalog Schemas (Mapped to Database) ---

/// User
///
/// A reader's canonical record from the `profiles` table. `access_level` is the
/// reader's privilege rank: higher values unlock more restricted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    // 'reader' or 'admin'.
    pub role: String,
    pub access_level: i32,
}

/// Series
///
/// A named, access-level-gated grouping of books. `id` is assigned by the store
/// on creation and never changes; `name` is not unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Series {
    pub id: Uuid,
    pub name: String,
    /// Minimum reader access level required to see this series.
    pub access_level: i32,
}

impl Series {
    /// The visibility rule, stated literally: the series is visible when its
    /// required level does not exceed the reader's level.
    pub fn is_visible_to(&self, reader_access_level: i32) -> bool {
        self.access_level <= reader_access_level
    }

    /// Overwrites the mutable fields with validated input. The id is untouched.
    pub fn apply(&mut self, input: SeriesInput) {
        self.name = input.name;
        self.access_level = input.access_level;
    }
}

/// Book
///
/// Referenced, not owned, by the series handlers. `series_id` may point at a
/// series that no longer exists; deleting a series never touches its books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "series")]
    pub series_id: Option<Uuid>,
    pub series_index: i32,
    pub access_level: i32,
}

// --- Request Payloads (Input Schemas) ---

/// SeriesSearch
///
/// Query parameters accepted by the series listing (GET /series?name=...).
/// Echoed back in the listing view so the search form can be re-populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, IntoParams, Default)]
#[ts(export)]
pub struct SeriesSearch {
    /// Case-insensitive substring filter on the series name.
    pub name: Option<String>,
}

impl SeriesSearch {
    /// The effective name filter: blank input means no filter.
    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// SeriesForm
///
/// Raw submission for create and update, from a form or a JSON body. Both
/// fields stay strings so a bad `accessLevel` surfaces as a validation notice
/// instead of an extractor rejection. JSON clients may send the level as a number.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct SeriesForm {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "accessLevel", default, deserialize_with = "level_text")]
    pub access_level: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelField {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn level_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LevelField::deserialize(deserializer)? {
        LevelField::Text(text) => text,
        LevelField::Integer(n) => n.to_string(),
        // 2.5 stays "2.5" and fails integer parsing later.
        LevelField::Float(n) => n.to_string(),
    })
}

/// SeriesInput
///
/// A validated form: what the store actually receives.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesInput {
    pub name: String,
    pub access_level: i32,
}

impl SeriesForm {
    /// Coerces the submitted strings into a `SeriesInput`.
    pub fn parse(&self) -> Result<SeriesInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required".to_string());
        }
        let access_level = self
            .access_level
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("accessLevel {:?} is not an integer", self.access_level))?;

        Ok(SeriesInput {
            name: name.to_string(),
            access_level,
        })
    }
}
