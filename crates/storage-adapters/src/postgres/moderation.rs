use async_trait::async_trait;
use domains::{
    Application, ApplicationRepository, ApplicationStatus, NewApplication, NewReport, Report,
    ReportRepository, Result,
};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{db_error, PgStore};

fn application_from_row(row: &PgRow) -> Result<Application> {
    let status: String = row.try_get("status").map_err(db_error)?;
    Ok(Application {
        id: row.try_get("id").map_err(db_error)?,
        organization_name: row.try_get("organization_name").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        activity_details: row.try_get("activity_details").map_err(db_error)?,
        status: match status.as_str() {
            "approved" => ApplicationStatus::Approved,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        },
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

fn report_from_row(row: &PgRow) -> Result<Report> {
    Ok(Report {
        id: row.try_get("id").map_err(db_error)?,
        reason: row.try_get("reason").map_err(db_error)?,
        event_id: row.try_get("event_id").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn insert(&self, application: NewApplication) -> Result<Application> {
        let row = sqlx::query(
            "INSERT INTO applications (organization_name, email, activity_details) \
             VALUES ($1, $2, $3) \
             RETURNING id, organization_name, email, activity_details, status, created_at",
        )
        .bind(&application.organization_name)
        .bind(&application.email)
        .bind(&application.activity_details)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        application_from_row(&row)
    }

    async fn list_pending(&self) -> Result<Vec<Application>> {
        sqlx::query(
            "SELECT id, organization_name, email, activity_details, status, created_at \
             FROM applications WHERE status = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(ApplicationStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(application_from_row)
        .collect()
    }

    async fn find(&self, id: i64) -> Result<Option<Application>> {
        sqlx::query(
            "SELECT id, organization_name, email, activity_details, status, created_at \
             FROM applications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(application_from_row)
        .transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReportRepository for PgStore {
    async fn insert(&self, report: NewReport) -> Result<Report> {
        let row = sqlx::query(
            "INSERT INTO reports (reason, event_id) VALUES ($1, $2) \
             RETURNING id, reason, event_id, created_at",
        )
        .bind(&report.reason)
        .bind(report.event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        report_from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Report>> {
        sqlx::query("SELECT id, reason, event_id, created_at FROM reports ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .iter()
            .map(report_from_row)
            .collect()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
