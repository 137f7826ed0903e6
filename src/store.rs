use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::debug;

use crate::model::attendance::AttendanceEvent;
use crate::model::project_site::{DEFAULT_RADIUS_METERS, ProjectSite};
use crate::writer::{AttendanceBackend, BackendError};

#[async_trait]
pub trait SiteDirectory: Send + Sync {
    async fn find_site(&self, id: u64) -> Result<Option<ProjectSite>, BackendError>;
    async fn list_sites(&self) -> Result<Vec<ProjectSite>, BackendError>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Employee linked to an authenticated user, if any.
    async fn employee_for_user(&self, user_id: u64) -> Result<Option<u64>, BackendError>;
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SITE_COLUMNS: &str =
    "SELECT id, title, latitude, longitude, COALESCE(radius_meters, ?) AS radius_meters FROM project_sites";

/// Bound values per upserted row.
const UPSERT_COLUMNS: usize = 12;
/// MySQL rejects prepared statements with more placeholders than this.
const MAX_PLACEHOLDERS: usize = 65_535;
const UPSERT_CHUNK_ROWS: usize = MAX_PLACEHOLDERS / UPSERT_COLUMNS;

/// One `INSERT ... ON DUPLICATE KEY UPDATE` per chunk that fits the placeholder limit.
/// The update list never touches `check_out`.
fn upsert_queries(events: &[AttendanceEvent]) -> Vec<QueryBuilder<'static, MySql>> {
    events
        .chunks(UPSERT_CHUNK_ROWS)
        .map(|chunk| {
            let mut query: QueryBuilder<MySql> = QueryBuilder::new(
                r#"
            INSERT INTO attendance
            (employee_id, date, check_in, status, check_in_latitude, check_in_longitude,
             verification_method, liveness_verified, is_within_radius, distance_meters,
             project_id, device_id)
            "#,
            );
            query.push_values(chunk, |mut row, e| {
                row.push_bind(e.employee_id)
                    .push_bind(e.date)
                    .push_bind(e.check_in_time)
                    .push_bind(e.status.to_string())
                    .push_bind(e.check_in_latitude)
                    .push_bind(e.check_in_longitude)
                    .push_bind(e.verification_method.to_string())
                    .push_bind(e.liveness_verified)
                    .push_bind(e.is_within_radius)
                    .push_bind(e.distance_meters)
                    .push_bind(e.project_id)
                    .push_bind(e.device_id.clone());
            });
            query.push(
                r#"
            ON DUPLICATE KEY UPDATE
                check_in = VALUES(check_in),
                status = VALUES(status),
                check_in_latitude = VALUES(check_in_latitude),
                check_in_longitude = VALUES(check_in_longitude),
                verification_method = VALUES(verification_method),
                liveness_verified = VALUES(liveness_verified),
                is_within_radius = VALUES(is_within_radius),
                distance_meters = VALUES(distance_meters),
                project_id = VALUES(project_id),
                device_id = VALUES(device_id)
            "#,
            );
            query
        })
        .collect()
}

#[async_trait]
impl AttendanceBackend for MySqlStore {
    async fn upsert(&self, events: &[AttendanceEvent]) -> Result<u64, BackendError> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut queries = upsert_queries(events);
        debug!(rows = events.len(), chunks = queries.len(), "Upserting attendance");

        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for query in queries.iter_mut() {
            affected += query.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

        Ok(affected)
    }

    async fn check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<u64, BackendError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?
            WHERE employee_id = ?
            AND date = ?
            AND check_out IS NULL
            "#,
        )
        .bind(time)
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SiteDirectory for MySqlStore {
    async fn find_site(&self, id: u64) -> Result<Option<ProjectSite>, BackendError> {
        let sql = format!("{SITE_COLUMNS} WHERE id = ?");
        let site = sqlx::query_as::<_, ProjectSite>(&sql)
            .bind(DEFAULT_RADIUS_METERS)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(site)
    }

    async fn list_sites(&self) -> Result<Vec<ProjectSite>, BackendError> {
        let sql = format!("{SITE_COLUMNS} ORDER BY title");
        let sites = sqlx::query_as::<_, ProjectSite>(&sql)
            .bind(DEFAULT_RADIUS_METERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(sites)
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn employee_for_user(&self, user_id: u64) -> Result<Option<u64>, BackendError> {
        let id = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE user_id = ? LIMIT 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}
