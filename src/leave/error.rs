//! Error taxonomy of the leave core.
//!
//! Each variant belongs to one [`ErrorClass`] and carries a stable code for
//! programmatic handling.

use chrono::NaiveDate;
use thiserror::Error;

use crate::leave::wizard::WizardStep;
use crate::model::leave_request::{EmployeeId, LeaveRequestId, LeaveStatus};

pub type Result<T> = std::result::Result<T, LeaveError>;

/// Recovery class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fix the input and try again; the draft is kept.
    Validation,
    /// Choose a different action (e.g. reject instead of approve).
    Policy,
    /// Retryable failure of an external collaborator.
    Infrastructure,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LeaveError {
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("medical leave requires at least one supporting document")]
    MissingDocument,

    #[error("document name must be 1 to {limit} characters, got {chars}")]
    InvalidDocumentName { chars: usize, limit: usize },

    #[error("document '{name}' has unsupported type '{mime_type}' (allowed: image, pdf, word)")]
    UnsupportedDocument { name: String, mime_type: String },

    #[error("document '{name}' is {size_bytes} bytes, limit is {limit_bytes} bytes")]
    DocumentTooLarge {
        name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    #[error("step '{step}' is incomplete: {reason}")]
    ValidationFailed { step: WizardStep, reason: String },

    #[error("wizard action not allowed: {0}")]
    WizardAction(String),

    #[error(
        "approving {requested} day(s) would overdraw the balance of employee {employee_id} ({remaining} day(s) remaining)"
    )]
    BalanceViolation {
        employee_id: EmployeeId,
        requested: u32,
        remaining: i64,
    },

    #[error("leave request {id} is already {status}")]
    NotPending {
        id: LeaveRequestId,
        status: LeaveStatus,
    },

    #[error("leave request {0} not found")]
    NotFound(LeaveRequestId),

    #[error("leave store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("document upload failed: {0}")]
    UploadFailed(String),

    #[error("document unavailable: {0}")]
    DocumentUnavailable(String),
}

impl LeaveError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LeaveError::InvalidRange { .. }
            | LeaveError::MissingDocument
            | LeaveError::InvalidDocumentName { .. }
            | LeaveError::UnsupportedDocument { .. }
            | LeaveError::DocumentTooLarge { .. }
            | LeaveError::ValidationFailed { .. }
            | LeaveError::WizardAction(_) => ErrorClass::Validation,
            LeaveError::BalanceViolation { .. } | LeaveError::NotPending { .. } => {
                ErrorClass::Policy
            }
            LeaveError::NotFound(_)
            | LeaveError::StoreUnavailable(_)
            | LeaveError::UploadFailed(_)
            | LeaveError::DocumentUnavailable(_) => ErrorClass::Infrastructure,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            LeaveError::InvalidRange { .. } => "INVALID_RANGE",
            LeaveError::MissingDocument => "MISSING_DOCUMENT",
            LeaveError::InvalidDocumentName { .. } => "INVALID_DOCUMENT_NAME",
            LeaveError::UnsupportedDocument { .. } => "UNSUPPORTED_DOCUMENT",
            LeaveError::DocumentTooLarge { .. } => "DOCUMENT_TOO_LARGE",
            LeaveError::ValidationFailed { .. } => "VALIDATION_FAILED",
            LeaveError::WizardAction(_) => "WIZARD_ACTION",
            LeaveError::BalanceViolation { .. } => "BALANCE_VIOLATION",
            LeaveError::NotPending { .. } => "NOT_PENDING",
            LeaveError::NotFound(_) => "NOT_FOUND",
            LeaveError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            LeaveError::UploadFailed(_) => "UPLOAD_FAILED",
            LeaveError::DocumentUnavailable(_) => "DOCUMENT_UNAVAILABLE",
        }
    }

    /// Infrastructure failures other than a missing record may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LeaveError::StoreUnavailable(_) | LeaveError::UploadFailed(_)
        )
    }
}
