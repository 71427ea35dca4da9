use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::leave::calendar::is_within_current_year;
use crate::leave::error::LeaveError;
use crate::model::balance::LeaveBalance;
use crate::model::leave_request::{EmployeeId, LeaveRequest, LeaveRequestId};
use crate::state::AppState;
use crate::store::{LeaveFilter, with_retry};

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
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
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

/// Optional decision comment for approve and reject.
#[derive(Deserialize, ToSchema)]
pub struct DecisionBody {
    #[schema(example = "Enjoy your time off")]
    pub comment: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Only requests starting in the current year
    pub current_year: Option<bool>,
}

async fn load(state: &AppState, id: LeaveRequestId) -> Result<LeaveRequest, LeaveError> {
    Ok(with_retry(state.retry_attempts(), "get", || state.store.get(id)).await?)
}

fn forbidden() -> actix_web::Error {
    actix_web::error::ErrorForbidden(serde_json::json!({
        "error": "FORBIDDEN",
        "message": "Not allowed to view this leave request"
    }))
}

fn comment_of(body: Option<web::Json<DecisionBody>>) -> Option<String> {
    body.and_then(|b| b.into_inner().comment)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/* =========================
Self-service
========================= */

/// Own leave balance for the current year
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Current balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let balance = state.accounting.current_balance(employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Own leave history, newest first
#[utoipa::path(
    get,
    path = "/api/leave/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Leave history", body = Vec<LeaveRequest>),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_history(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let mut history = with_retry(state.retry_attempts(), "list_by_employee", || {
        state.store.list_by_employee(employee_id)
    })
    .await
    .map_err(LeaveError::from)?;

    if query.current_year.unwrap_or(false) {
        let today = state.accounting.clock().today();
        history.retain(|r| is_within_current_year(r.start_date, today));
    }
    Ok(HttpResponse::Ok().json(history))
}

/* =========================
Chef views
========================= */

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_chef()?;

    let filter = query.into_inner();
    let page = with_retry(state.retry_attempts(), "list", || state.store.list(&filter))
        .await
        .map_err(LeaveError::from)?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// Balance of any employee
#[utoipa::path(
    get,
    path = "/api/leave/employees/{employee_id}/balance",
    params(("employee_id" = u64, Path, description = "Employee to inspect")),
    responses(
        (status = 200, description = "Current balance", body = LeaveBalance),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn employee_balance(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_chef()?;
    let balance = state
        .accounting
        .current_balance(EmployeeId(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = load(&state, LeaveRequestId(path.into_inner())).await?;
    if !auth.can_view(leave.employee_id) {
        return Err(forbidden());
    }
    Ok(HttpResponse::Ok().json(leave))
}

/// Download one supporting document
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}/documents/{index}",
    params(
        ("leave_id" = u64, Path, description = "Leave request"),
        ("index" = usize, Path, description = "Position in the attachment list")
    ),
    responses(
        (status = 200, description = "Document bytes", content_type = "application/octet-stream"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No such request or document"),
        (status = 503, description = "Document storage unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn download_document(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(u64, usize)>,
) -> actix_web::Result<impl Responder> {
    let (leave_id, index) = path.into_inner();
    let leave = load(&state, LeaveRequestId(leave_id)).await?;
    if !auth.can_view(leave.employee_id) {
        return Err(forbidden());
    }

    let Some(document) = leave.documents.get(index) else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "NOT_FOUND",
            "message": format!("leave request {leave_id} has no document at position {index}")
        })));
    };

    let bytes = state.documents.get(&document.storage_ref).await?;
    Ok(HttpResponse::Ok()
        .content_type(document.mime_type.as_str())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.original_name.clone())],
        })
        .body(bytes))
}

/* =========================
Approve leave (Chef)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    request_body(content = Option<DecisionBody>, description = "Optional comment"),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided or balance exceeded"),
        (status = 503, description = "Store unavailable, still pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    body: Option<web::Json<DecisionBody>>,
) -> actix_web::Result<impl Responder> {
    auth.require_chef()?;
    let leave = state
        .approvals
        .approve(LeaveRequestId(path.into_inner()), auth.user_id, comment_of(body))
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (Chef)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body(content = Option<DecisionBody>, description = "Optional comment"),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    body: Option<web::Json<DecisionBody>>,
) -> actix_web::Result<impl Responder> {
    auth.require_chef()?;
    let leave = state
        .approvals
        .reject(LeaveRequestId(path.into_inner()), auth.user_id, comment_of(body))
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}
