use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave_request::EmployeeId;

/// Annual leave balance of one employee for one accounting year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 1000,
    "year": 2026,
    "total_days": 30,
    "used_days": 5,
    "remaining_days": 25,
    "medical_days_used": 2
}))]
pub struct LeaveBalance {
    #[schema(value_type = u64)]
    pub employee_id: EmployeeId,
    pub year: i32,
    pub total_days: u32,
    pub used_days: u32,
    /// `total_days - used_days`
    pub remaining_days: i64,
    /// Reporting only, never deducted from `total_days`.
    pub medical_days_used: u32,
}

impl LeaveBalance {
    pub fn new(employee_id: EmployeeId, year: i32, total_days: u32) -> Self {
        Self {
            employee_id,
            year,
            total_days,
            used_days: 0,
            remaining_days: i64::from(total_days),
            medical_days_used: 0,
        }
    }

    pub(crate) fn add_used(&mut self, days: u32) {
        self.used_days = self.used_days.saturating_add(days);
        self.remaining_days = i64::from(self.total_days) - i64::from(self.used_days);
    }

    pub(crate) fn add_medical(&mut self, days: u32) {
        self.medical_days_used = self.medical_days_used.saturating_add(days);
    }
}
