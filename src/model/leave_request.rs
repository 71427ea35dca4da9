use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::model::document::Document;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LeaveRequestId(pub u64);

/// Authenticated account, used to record who decided a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Leave category, governs deduction and document policy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    EnumString,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveCategory {
    Paid,
    Unpaid,
    Medical,
    Personal,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    EnumString,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Approved and Rejected accept no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// A persisted leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "category": "paid",
    "start_date": "2026-03-10",
    "end_date": "2026-03-12",
    "number_of_days": 3,
    "reason": "Family visit in Sousse",
    "documents": [],
    "status": "pending",
    "decision_comment": null,
    "decided_by": null,
    "created_at": "2026-03-01T08:00:00Z",
    "decided_at": null
}))]
pub struct LeaveRequest {
    #[schema(value_type = u64)]
    pub id: LeaveRequestId,
    #[schema(value_type = u64)]
    pub employee_id: EmployeeId,
    pub category: LeaveCategory,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Always derived from the two dates.
    pub number_of_days: u32,
    pub reason: String,
    pub documents: Vec<Document>,
    pub status: LeaveStatus,
    pub decision_comment: Option<String>,
    #[schema(value_type = Option<u64>)]
    pub decided_by: Option<UserId>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// A validated candidate handed to the store on wizard submission.
///
/// Construct through the wizard; `number_of_days` is computed from the dates.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: EmployeeId,
    pub category: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_days: u32,
    pub reason: String,
    pub documents: Vec<Document>,
    pub created_at: DateTime<Utc>,
}

impl NewLeaveRequest {
    /// Materialize the stored form with the id assigned by the store.
    pub fn into_request(self, id: LeaveRequestId) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            category: self.category,
            start_date: self.start_date,
            end_date: self.end_date,
            number_of_days: self.number_of_days,
            reason: self.reason,
            documents: self.documents,
            status: LeaveStatus::Pending,
            decision_comment: None,
            decided_by: None,
            created_at: self.created_at,
            decided_at: None,
        }
    }
}
