use crate::model::leave_request::LeaveCategory;

/// Annual allotment used when `ANNUAL_LEAVE_DAYS` is not set.
pub const DEFAULT_ANNUAL_DAYS: u32 = 30;

/// Minimum reason length, in characters, before a request can be submitted.
pub const MIN_REASON_CHARS: usize = 10;

/// Deduction policy applied by balance accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePolicy {
    pub annual_days: u32,
    /// Whether personal leave draws from the paid pool.
    pub personal_deducts: bool,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            annual_days: DEFAULT_ANNUAL_DAYS,
            personal_deducts: false,
        }
    }
}

impl LeavePolicy {
    pub fn deducts(&self, category: LeaveCategory) -> bool {
        match category {
            LeaveCategory::Paid => true,
            LeaveCategory::Personal => self.personal_deducts,
            LeaveCategory::Unpaid | LeaveCategory::Medical => false,
        }
    }
}
