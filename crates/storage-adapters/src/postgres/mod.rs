//! # PostgreSQL adapters
//!
//! One `PgStore` implements every store port. Queries are built at runtime
//! with `sqlx::query` / `QueryBuilder` so the crate compiles without a live
//! database.

mod events;
mod messages;
mod moderation;
mod profiles;

use std::str::FromStr;

use domains::DomainError;
use sqlx::postgres::{PgPool, PgPoolOptions};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> domains::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_error)?;
        Ok(Self { pool })
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> domains::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::internal(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a driver error onto the domain taxonomy. Unique violations are the
/// only failure a caller can act on.
pub(crate) fn db_error(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::Conflict(db.message().to_string());
        }
    }
    tracing::error!(error = %e, "database error");
    DomainError::internal(e.to_string())
}

/// Parses a text column into one of the domain enums.
pub(crate) fn parse_column<T: FromStr>(value: &str, column: &'static str) -> domains::Result<T> {
    value
        .parse()
        .map_err(|_| DomainError::internal(format!("unexpected {column} value '{value}'")))
}

/// Escapes `LIKE` metacharacters so a keyword only ever matches literally.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
