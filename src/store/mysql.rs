use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{LeaveQuery, LeaveStore, RequesterDirectory, SubmissionOrder};
use crate::error::StoreError;
use crate::model::leave_request::{LeaveRequest, LeaveTransition, NewLeaveRequest};
use crate::model::requester::RequesterProfile;

const LEAVE_COLUMNS: &str = r#"
    id, requester_id, requester_name, category, start_date, end_date, reason,
    days_requested, status, submitted_at, processed_at, processed_by, rejection_reason
"#;

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Row shape of `leave_requests`; enums are stored as their lowercase names.
#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    requester_id: u64,
    requester_name: String,
    category: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    days_requested: u32,
    status: String,
    submitted_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    processed_by: Option<u64>,
    rejection_reason: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let category = row.category.parse().map_err(|_| {
            StoreError::Malformed(format!(
                "leave request {} has unknown category {:?}",
                row.id, row.category
            ))
        })?;
        let status = row.status.parse().map_err(|_| {
            StoreError::Malformed(format!(
                "leave request {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            requester_id: row.requester_id,
            requester_name: row.requester_name,
            category,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            days_requested: row.days_requested,
            status,
            submitted_at: row.submitted_at,
            processed_at: row.processed_at,
            processed_by: row.processed_by,
            rejection_reason: row.rejection_reason,
        })
    }
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn insert(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (requester_id, requester_name, category, start_date, end_date,
                 reason, days_requested, status, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(request.requester_id)
        .bind(&request.requester_name)
        .bind(request.category.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.days_requested)
        .bind(request.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(request.into_request(result.last_insert_id()))
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn query(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(requester_id) = query.requester_id {
            where_sql.push_str(" AND requester_id = ?");
            args.push(FilterValue::U64(requester_id));
        }

        if let Some(status) = &query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }

        let order_sql = match query.order {
            SubmissionOrder::NewestFirst => "ORDER BY submitted_at DESC, id DESC",
            SubmissionOrder::OldestFirst => "ORDER BY submitted_at ASC, id ASC",
        };

        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} {order_sql}");

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        data_q
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn decide_pending(
        &self,
        id: u64,
        transition: &LeaveTransition,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, processed_at = ?, processed_by = ?, rejection_reason = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(transition.status.as_ref())
        .bind(transition.processed_at)
        .bind(transition.processed_by)
        .bind(transition.rejection_reason.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_pending(&self, id: u64, requester_id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM leave_requests
            WHERE id = ?
            AND requester_id = ?
            AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Reads teacher profiles from the `employees` table.
#[derive(Clone)]
pub struct MySqlRequesterDirectory {
    pool: MySqlPool,
}

impl MySqlRequesterDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const PROFILE_SELECT: &str = r#"
    SELECT
        e.id AS id,
        CONCAT(e.first_name, ' ', e.last_name) AS display_name,
        d.name AS department
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
"#;

#[async_trait]
impl RequesterDirectory for MySqlRequesterDirectory {
    async fn find(&self, id: u64) -> Result<Option<RequesterProfile>, StoreError> {
        let sql = format!("{PROFILE_SELECT} WHERE e.id = ?");
        Ok(sqlx::query_as::<_, RequesterProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self) -> Result<Vec<RequesterProfile>, StoreError> {
        let sql = format!("{PROFILE_SELECT} ORDER BY e.last_name, e.first_name");
        Ok(sqlx::query_as::<_, RequesterProfile>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}
