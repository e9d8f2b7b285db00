use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domains::{
    DomainError, Event, EventQuery, EventRepository, NewEvent, Result, SearchResult, SortOrder,
};
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use super::{db_error, escape_like, parse_column, PgStore};

const COLUMNS: &str = "id, title, description, category, area, event_date, location, \
    contact_phone, image_key, extra_image_keys, tags, poster_id, is_hidden, view_count, \
    image_change_count, created_at, updated_at";

fn event_from_row(row: &PgRow) -> Result<Event> {
    let category: Option<String> = row.try_get("category").map_err(db_error)?;
    let area: String = row.try_get("area").map_err(db_error)?;
    Ok(Event {
        id: row.try_get("id").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        category: category
            .as_deref()
            .map(|c| parse_column(c, "category"))
            .transpose()?,
        area: parse_column(&area, "area")?,
        event_date: row.try_get("event_date").map_err(db_error)?,
        location: row.try_get("location").map_err(db_error)?,
        contact_phone: row.try_get("contact_phone").map_err(db_error)?,
        image_key: row.try_get("image_key").map_err(db_error)?,
        extra_image_keys: row.try_get("extra_image_keys").map_err(db_error)?,
        tags: row.try_get("tags").map_err(db_error)?,
        poster_id: row.try_get("poster_id").map_err(db_error)?,
        is_hidden: row.try_get("is_hidden").map_err(db_error)?,
        view_count: row.try_get("view_count").map_err(db_error)?,
        image_change_count: row.try_get("image_change_count").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

/// Appends the `WHERE` clause for `query`. Shared by the count and the page
/// query so both always agree on the predicate.
fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    qb.push(" WHERE NOT is_hidden AND event_date >= ");
    qb.push_bind(query.from);
    if let Some(until) = query.until {
        qb.push(" AND event_date <= ");
        qb.push_bind(until);
    }
    if let Some(category) = query.category {
        qb.push(" AND category = ");
        qb.push_bind(category.label());
    }
    if let Some(area) = query.area {
        qb.push(" AND area = ");
        qb.push_bind(area.label());
    }
    if let Some(keyword) = &query.keyword {
        qb.push(" AND (title ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(keyword)));
        qb.push(" OR ");
        qb.push_bind(keyword.clone());
        qb.push(" = ANY(tags))");
    }
    if let Some(tag) = &query.required_tag {
        qb.push(" AND ");
        qb.push_bind(tag.clone());
        qb.push(" = ANY(tags)");
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn find(&self, id: i64) -> Result<Option<Event>> {
        sqlx::query(&format!("SELECT {COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(event_from_row)
            .transpose()
    }

    async fn insert(&self, event: NewEvent) -> Result<Event> {
        let row = sqlx::query(&format!(
            "INSERT INTO events (title, description, category, area, event_date, location, \
             contact_phone, image_key, extra_image_keys, tags, poster_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) RETURNING {COLUMNS}"
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.map(|c| c.label()))
        .bind(event.area.label())
        .bind(event.event_date)
        .bind(&event.location)
        .bind(&event.contact_phone)
        .bind(&event.image_key)
        .bind(&event.extra_image_keys)
        .bind(&event.tags)
        .bind(event.poster_id)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        event_from_row(&row)
    }

    async fn update(&self, event: Event) -> Result<Event> {
        let row = sqlx::query(&format!(
            "UPDATE events SET title = $2, description = $3, category = $4, area = $5, \
             event_date = $6, location = $7, contact_phone = $8, image_key = $9, \
             extra_image_keys = $10, tags = $11, image_change_count = $12, updated_at = $13 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.map(|c| c.label()))
        .bind(event.area.label())
        .bind(event.event_date)
        .bind(&event.location)
        .bind(&event.contact_phone)
        .bind(&event.image_key)
        .bind(&event.extra_image_keys)
        .bind(&event.tags)
        .bind(event.image_change_count)
        .bind(event.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| DomainError::not_found("Event", event.id))?;
        event_from_row(&row)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_hidden(&self, id: i64, hidden: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE events SET is_hidden = $2 WHERE id = $1")
            .bind(id)
            .bind(hidden)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE events SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_created_since(&self, poster_id: Uuid, since: DateTime<Utc>) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE poster_id = $1 AND created_at >= $2")
                .bind(poster_id)
                .bind(since)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(count.max(0) as u64)
    }

    async fn list_for_dashboard(&self, poster_id: Option<Uuid>) -> Result<Vec<Event>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM events"));
        if let Some(poster_id) = poster_id {
            qb.push(" WHERE poster_id = ");
            qb.push_bind(poster_id);
        }
        qb.push(" ORDER BY event_date DESC, id DESC");

        qb.build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(event_from_row)
            .collect()
    }

    async fn search(&self, query: &EventQuery) -> Result<SearchResult> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_predicate(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let mut page = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM events"));
        push_predicate(&mut page, query);
        page.push(match query.sort {
            SortOrder::DateAsc => " ORDER BY event_date ASC, id ASC",
            SortOrder::Newest => " ORDER BY created_at DESC, id DESC",
        });
        page.push(" LIMIT ");
        page.push_bind(i64::from(query.limit));
        page.push(" OFFSET ");
        page.push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let events = page
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(event_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchResult {
            events,
            total: total.max(0) as u64,
        })
    }

    async fn expired_with_images(&self, before: NaiveDate) -> Result<Vec<Event>> {
        sqlx::query(&format!(
            "SELECT {COLUMNS} FROM events WHERE event_date < $1 AND image_key IS NOT NULL ORDER BY id"
        ))
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(event_from_row)
        .collect()
    }

    async fn clear_images(&self, ids: &[i64]) -> Result<u64> {
        let result = sqlx::query("UPDATE events SET image_key = NULL WHERE id = ANY($1) AND image_key IS NOT NULL")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
