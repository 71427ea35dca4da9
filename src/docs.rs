use crate::api::leave_request::{DecisionBody, LeaveListResponse};
use crate::api::wizard::{CategoryBody, PeriodBody, ReasonBody};
use crate::leave::wizard::{LeaveDraft, WizardState, WizardStep};
use crate::model::balance::LeaveBalance;
use crate::model::document::Document;
use crate::model::leave_request::{LeaveCategory, LeaveRequest, LeaveStatus};
use crate::store::LeaveFilter;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Desk API",
        version = "1.0.0",
        description = r#"
## Leave Desk

Leave request lifecycle and balance accounting for the HR dashboard.

### 🔹 Key Features
- **Request wizard**
  - Category, period, reason, supporting documents, review and submit
- **Decisions**
  - Chefs approve or reject pending requests; decisions are final
- **Balances**
  - Annual paid-leave balance recomputed from approved history

### 🔐 Security
Every endpoint requires a **JWT Bearer** token issued by the identity provider.
Approvals, rejections and the global list are restricted to the **Chef** role.

### 📦 Errors
Failures answer with `{"error": CODE, "message": ...}`.
Validation problems use 422, refused decisions 409, and retryable outages 503.
"#,
    ),
    paths(
        crate::api::wizard::wizard_state,
        crate::api::wizard::select_category,
        crate::api::wizard::set_period,
        crate::api::wizard::set_reason,
        crate::api::wizard::upload_document,
        crate::api::wizard::remove_document,
        crate::api::wizard::advance,
        crate::api::wizard::back,
        crate::api::wizard::revisit,
        crate::api::wizard::submit,
        crate::api::wizard::reset,

        crate::api::leave_request::my_balance,
        crate::api::leave_request::my_history,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::employee_balance,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::download_document,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveCategory,
            LeaveStatus,
            LeaveBalance,
            Document,
            DecisionBody,
            CategoryBody,
            PeriodBody,
            ReasonBody,
            LeaveDraft,
            WizardState,
            WizardStep
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Leave wizard", description = "Step-by-step leave request creation"),
        (name = "Leave", description = "Leave decisions, history and balances"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by every path.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_leave_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave/wizard/submit"));
        assert!(doc.paths.paths.contains_key("/api/leave/{leave_id}/approve"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
