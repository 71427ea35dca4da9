use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::leave::error::{ErrorClass, LeaveError};

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match (self, self.class()) {
            (LeaveError::WizardAction(_), _) => StatusCode::BAD_REQUEST,
            (LeaveError::NotFound(_), _) => StatusCode::NOT_FOUND,
            (_, ErrorClass::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorClass::Policy) => StatusCode::CONFLICT,
            (_, ErrorClass::Infrastructure) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        // extra context for the variants a client acts on
        match self {
            LeaveError::ValidationFailed { step, .. } => body["step"] = json!(step),
            LeaveError::BalanceViolation {
                requested,
                remaining,
                ..
            } => {
                body["requested"] = json!(requested);
                body["remaining"] = json!(remaining);
            }
            LeaveError::NotPending { status, .. } => body["status"] = json!(status),
            _ => {}
        }
        if self.is_retryable() {
            body["retryable"] = json!(true);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
