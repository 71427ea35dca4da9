use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::error;

use super::{LeaveFilter, LeaveMutation, LeavePage, LeaveRequestStore, StoreError};
use crate::model::document::{Document, StorageRef};
use crate::model::leave_request::{
    EmployeeId, LeaveCategory, LeaveRequest, LeaveRequestId, LeaveStatus, NewLeaveRequest, UserId,
};

const SELECT_LEAVE: &str = r#"
    SELECT id, employee_id, category, start_date, end_date, number_of_days, reason,
           status, decision_comment, decided_by, created_at, decided_at
    FROM leave_requests
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    category: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    number_of_days: u32,
    reason: String,
    status: String,
    decision_comment: Option<String>,
    decided_by: Option<u64>,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct DocumentRow {
    leave_request_id: u64,
    original_name: String,
    mime_type: String,
    size_bytes: u64,
    storage_ref: String,
}

impl LeaveRow {
    fn into_request(self, documents: Vec<Document>) -> Result<LeaveRequest, StoreError> {
        let corrupt = |field: &str, value: &str| {
            error!(leave_id = self.id, field, value, "Unreadable leave row");
            StoreError::Unavailable(format!("leave request {} has invalid {}", self.id, field))
        };
        let category =
            LeaveCategory::from_str(&self.category).map_err(|_| corrupt("category", &self.category))?;
        let status = LeaveStatus::from_str(&self.status).map_err(|_| corrupt("status", &self.status))?;

        Ok(LeaveRequest {
            id: LeaveRequestId(self.id),
            employee_id: EmployeeId(self.employee_id),
            category,
            start_date: self.start_date,
            end_date: self.end_date,
            number_of_days: self.number_of_days,
            reason: self.reason,
            documents,
            status,
            decision_comment: self.decision_comment,
            decided_by: self.decided_by.map(UserId),
            created_at: self.created_at,
            decided_at: self.decided_at,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Leave requests in `leave_requests`, attachments in `leave_documents`.
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_documents(&self, ids: &[u64]) -> Result<HashMap<u64, Vec<Document>>, StoreError> {
        let mut grouped: HashMap<u64, Vec<Document>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT leave_request_id, original_name, mime_type, size_bytes, storage_ref
            FROM leave_documents
            WHERE leave_request_id IN ({})
            ORDER BY leave_request_id, position
            "#,
            placeholders
        );

        let mut q = sqlx::query_as::<_, DocumentRow>(&sql);
        for id in ids {
            q = q.bind(*id);
        }
        for row in q.fetch_all(&self.pool).await? {
            grouped.entry(row.leave_request_id).or_default().push(Document {
                original_name: row.original_name,
                mime_type: row.mime_type,
                size_bytes: row.size_bytes,
                storage_ref: StorageRef(row.storage_ref),
            });
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<LeaveRow>) -> Result<Vec<LeaveRequest>, StoreError> {
        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        let mut documents = self.load_documents(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let docs = documents.remove(&row.id).unwrap_or_default();
                row.into_request(docs)
            })
            .collect()
    }
}

#[async_trait]
impl LeaveRequestStore for MySqlLeaveStore {
    async fn create(&self, request: NewLeaveRequest) -> Result<LeaveRequestId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, category, start_date, end_date, number_of_days, reason, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(request.employee_id.0)
        .bind(request.category.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.number_of_days)
        .bind(&request.reason)
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_id();

        for (position, doc) in request.documents.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO leave_documents
                    (leave_request_id, position, original_name, mime_type, size_bytes, storage_ref)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(position as u32)
            .bind(&doc.original_name)
            .bind(&doc.mime_type)
            .bind(doc.size_bytes)
            .bind(&doc.storage_ref.0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(LeaveRequestId(id))
    }

    async fn get(&self, id: LeaveRequestId) -> Result<LeaveRequest, StoreError> {
        let sql = format!("{SELECT_LEAVE} WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_by_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!("{SELECT_LEAVE} WHERE employee_id = ? ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id.0)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn update(&self, id: LeaveRequestId, mutation: LeaveMutation) -> Result<(), StoreError> {
        let LeaveMutation::Decide {
            status,
            decided_by,
            comment,
            decided_at,
        } = mutation;

        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, decided_by = ?, decision_comment = ?, decided_at = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.as_ref())
        .bind(decided_by.0)
        .bind(comment)
        .bind(decided_at)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // nothing updated: tell a missing row from an already decided one
        let current = sqlx::query_scalar::<_, String>("SELECT status FROM leave_requests WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match current {
            None => Err(StoreError::NotFound(id)),
            Some(s) => {
                let status = LeaveStatus::from_str(&s)
                    .map_err(|_| StoreError::Unavailable(format!("leave request {id} has invalid status")))?;
                Err(StoreError::Conflict { id, status })
            }
        }
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<LeavePage, StoreError> {
        let (page, per_page, offset) = filter.window();

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }

        if let Some(status) = &filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.as_ref()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "{SELECT_LEAVE}{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_sql
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(LeavePage {
            data: self.hydrate(rows).await?,
            page,
            per_page,
            total: total.max(0) as u64,
        })
    }
}
