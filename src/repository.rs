use crate::models::{Book, Series, SeriesInput, User};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// RepoError
///
/// Failure taxonomy of the persistence layer. Handlers map every variant to a
/// redirect or a re-rendered form; none of them escape as an HTTP error.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The id does not resolve to a record (or it vanished between fetch and write).
    #[error("record not found")]
    NotFound,
    /// The store refused a write, e.g. a constraint violation.
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Database-reported errors on a write (constraint checks, bad values) become
    /// `Rejected`; connection-level failures stay `Database`.
    fn from_write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => RepoError::Rejected(db.message().to_string()),
            other => RepoError::Database(other),
        }
    }
}

/// Repository Trait
///
/// The abstract contract for every catalog persistence operation. Handlers only
/// see `Arc<dyn Repository>`, so Postgres and the in-memory store are
/// interchangeable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Readers ---
    async fn get_user(&self, id: Uuid) -> Result<User, RepoError>;
    async fn create_user(&self, user: User) -> Result<User, RepoError>;

    // --- Series ---
    /// Series with `access_level <= max_access_level`, optionally narrowed by a
    /// case-insensitive substring of the name, sorted ascending by name.
    async fn list_series(
        &self,
        max_access_level: i32,
        name_filter: Option<&str>,
    ) -> Result<Vec<Series>, RepoError>;
    async fn get_series(&self, id: Uuid) -> Result<Series, RepoError>;
    /// Persists a new series; the store assigns the id.
    async fn create_series(&self, input: SeriesInput) -> Result<Series, RepoError>;
    /// Overwrites name and access level of an existing series. Last write wins.
    async fn update_series(&self, series: &Series) -> Result<Series, RepoError>;
    async fn delete_series(&self, id: Uuid) -> Result<(), RepoError>;

    // --- Books ---
    /// Books of a series with `access_level <= max_access_level`, sorted by `series_index`.
    async fn get_books_in_series(
        &self,
        series_id: Uuid,
        max_access_level: i32,
    ) -> Result<Vec<Book>, RepoError>;
    async fn create_book(&self, book: Book) -> Result<Book, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL (schema in `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>("SELECT id, email, role, access_level FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO profiles (id, email, role, access_level) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, role, access_level",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.role)
        .bind(user.access_level)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_write)
    }

    /// list_series
    ///
    /// The name filter is a literal substring (no LIKE wildcards), case-folded
    /// under the "C" collation so only ASCII letters fold, whatever the database
    /// locale. Sorting uses the same collation, so the order is byte-wise. Both
    /// rules match the in-memory store.
    async fn list_series(
        &self,
        max_access_level: i32,
        name_filter: Option<&str>,
    ) -> Result<Vec<Series>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, name, access_level FROM series WHERE access_level <= ");
        builder.push_bind(max_access_level);

        if let Some(filter) = name_filter {
            builder.push(" AND POSITION(LOWER(");
            builder.push_bind(filter.to_string());
            builder.push(r#" COLLATE "C") IN LOWER(name COLLATE "C")) > 0"#);
        }

        builder.push(r#" ORDER BY name COLLATE "C" ASC"#);

        let series = builder
            .build_query_as::<Series>()
            .fetch_all(&self.pool)
            .await?;
        Ok(series)
    }

    async fn get_series(&self, id: Uuid) -> Result<Series, RepoError> {
        sqlx::query_as::<_, Series>("SELECT id, name, access_level FROM series WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn create_series(&self, input: SeriesInput) -> Result<Series, RepoError> {
        sqlx::query_as::<_, Series>(
            "INSERT INTO series (id, name, access_level) VALUES ($1, $2, $3) \
             RETURNING id, name, access_level",
        )
        .bind(Uuid::new_v4())
        .bind(input.name)
        .bind(input.access_level)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_write)
    }

    async fn update_series(&self, series: &Series) -> Result<Series, RepoError> {
        sqlx::query_as::<_, Series>(
            "UPDATE series SET name = $2, access_level = $3 WHERE id = $1 \
             RETURNING id, name, access_level",
        )
        .bind(series.id)
        .bind(&series.name)
        .bind(series.access_level)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_write)?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_series(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM series WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepoError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_books_in_series(
        &self,
        series_id: Uuid,
        max_access_level: i32,
    ) -> Result<Vec<Book>, RepoError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, series_id, series_index, access_level FROM books \
             WHERE series_id = $1 AND access_level <= $2 \
             ORDER BY series_index ASC",
        )
        .bind(series_id)
        .bind(max_access_level)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn create_book(&self, book: Book) -> Result<Book, RepoError> {
        sqlx::query_as::<_, Book>(
            "INSERT INTO books (id, title, series_id, series_index, access_level) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, series_id, series_index, access_level",
        )
        .bind(book.id)
        .bind(book.title)
        .bind(book.series_id)
        .bind(book.series_index)
        .bind(book.access_level)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_write)
    }
}

// --- In-memory store ---

#[derive(Default)]
struct MemoryTables {
    users: HashMap<Uuid, User>,
    series: HashMap<Uuid, Series>,
    books: Vec<Book>,
}

/// MemoryRepository
///
/// An in-process `Repository` for tests and local experiments. It enforces the
/// same rules as the Postgres schema (non-blank series names) and can be told to
/// reject every series write to simulate a store failure.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<MemoryTables>,
    reject_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses every series write.
    pub fn new_rejecting() -> Self {
        let repo = Self::default();
        repo.set_reject_writes(true);
        repo
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn check_write(&self, name: &str) -> Result<(), RepoError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Rejected("writes are disabled".to_string()));
        }
        if name.trim().is_empty() {
            return Err(RepoError::Rejected("series name must not be blank".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<User, RepoError> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Rejected(format!("user {} already exists", user.id)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_series(
        &self,
        max_access_level: i32,
        name_filter: Option<&str>,
    ) -> Result<Vec<Series>, RepoError> {
        // ASCII-only folding, as LOWER() does under the "C" collation.
        let needle = name_filter.map(str::to_ascii_lowercase);
        let tables = self.tables.read().await;

        let mut series: Vec<Series> = tables
            .series
            .values()
            .filter(|s| s.access_level <= max_access_level)
            .filter(|s| match &needle {
                Some(n) => s.name.to_ascii_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        series.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(series)
    }

    async fn get_series(&self, id: Uuid) -> Result<Series, RepoError> {
        self.tables
            .read()
            .await
            .series
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn create_series(&self, input: SeriesInput) -> Result<Series, RepoError> {
        self.check_write(&input.name)?;
        let series = Series {
            id: Uuid::new_v4(),
            name: input.name,
            access_level: input.access_level,
        };
        self.tables
            .write()
            .await
            .series
            .insert(series.id, series.clone());
        Ok(series)
    }

    async fn update_series(&self, series: &Series) -> Result<Series, RepoError> {
        self.check_write(&series.name)?;
        let mut tables = self.tables.write().await;
        let stored = tables.series.get_mut(&series.id).ok_or(RepoError::NotFound)?;
        stored.name = series.name.clone();
        stored.access_level = series.access_level;
        Ok(stored.clone())
    }

    async fn delete_series(&self, id: Uuid) -> Result<(), RepoError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Rejected("writes are disabled".to_string()));
        }
        self.tables
            .write()
            .await
            .series
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn get_books_in_series(
        &self,
        series_id: Uuid,
        max_access_level: i32,
    ) -> Result<Vec<Book>, RepoError> {
        let tables = self.tables.read().await;
        let mut books: Vec<Book> = tables
            .books
            .iter()
            .filter(|b| b.series_id == Some(series_id) && b.access_level <= max_access_level)
            .cloned()
            .collect();
        books.sort_by_key(|b| b.series_index);
        Ok(books)
    }

    async fn create_book(&self, book: Book) -> Result<Book, RepoError> {
        self.tables.write().await.books.push(book.clone());
        Ok(book)
    }
}
