use async_trait::async_trait;
use domains::{DomainError, Profile, ProfileRepository, Result, Role};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::{db_error, parse_column, PgStore};

const COLUMNS: &str = "id, name, role, avatar_key, website_url, name_key, created_at";

fn profile_from_row(row: &PgRow) -> Result<Profile> {
    let role: String = row.try_get("role").map_err(db_error)?;
    Ok(Profile {
        id: row.try_get("id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        role: parse_column(&role, "role")?,
        avatar_key: row.try_get("avatar_key").map_err(db_error)?,
        website_url: row.try_get("website_url").map_err(db_error)?,
        name_key: row.try_get("name_key").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find(&self, id: Uuid) -> Result<Option<Profile>> {
        sqlx::query(&format!("SELECT {COLUMNS} FROM profiles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(profile_from_row)
            .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Profile>> {
        sqlx::query(&format!("SELECT {COLUMNS} FROM profiles WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(profile_from_row)
            .collect()
    }

    async fn find_by_name_key(&self, name_key: &str) -> Result<Option<Profile>> {
        sqlx::query(&format!("SELECT {COLUMNS} FROM profiles WHERE name_key = $1"))
            .bind(name_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .as_ref()
            .map(profile_from_row)
            .transpose()
    }

    async fn insert(&self, profile: Profile) -> Result<Profile> {
        let row = sqlx::query(&format!(
            "INSERT INTO profiles (id, name, role, avatar_key, website_url, name_key, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        ))
        .bind(profile.id)
        .bind(&profile.name)
        .bind(profile.role.as_str())
        .bind(&profile.avatar_key)
        .bind(&profile.website_url)
        .bind(&profile.name_key)
        .bind(profile.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        profile_from_row(&row)
    }

    async fn update(&self, profile: Profile) -> Result<Profile> {
        let row = sqlx::query(&format!(
            "UPDATE profiles SET name = $2, avatar_key = $3, website_url = $4, name_key = $5 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.avatar_key)
        .bind(&profile.website_url)
        .bind(&profile.name_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| DomainError::not_found("Profile", profile.id))?;
        profile_from_row(&row)
    }

    async fn list(&self, roles: Option<Vec<Role>>) -> Result<Vec<Profile>> {
        let order = "ORDER BY CASE role WHEN 'super_admin' THEN 0 WHEN 'admin' THEN 1 ELSE 2 END, name";
        let rows = match roles {
            Some(roles) => {
                let roles: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
                sqlx::query(&format!("SELECT {COLUMNS} FROM profiles WHERE role = ANY($1) {order}"))
                    .bind(roles)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query(&format!("SELECT {COLUMNS} FROM profiles {order}"))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error)?;
        rows.iter().map(profile_from_row).collect()
    }
}
