//! Leave request wizard endpoints.
//!
//! One wizard per employee is held server-side between calls; every response
//! carries the full [`WizardState`] so a client can render the current step.

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::leave::balance::BalanceSnapshot;
use crate::leave::document_gate;
use crate::leave::wizard::{WizardState, WizardStep};
use crate::model::document::DocumentMeta;
use crate::model::leave_request::LeaveCategory;
use crate::state::AppState;
use crate::utils::wizard_sessions::WizardHandle;

#[derive(Deserialize, ToSchema)]
pub struct CategoryBody {
    #[schema(example = "medical")]
    pub category: LeaveCategory,
}

#[derive(Deserialize, ToSchema)]
pub struct PeriodBody {
    #[schema(example = "2026-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct ReasonBody {
    #[schema(example = "Surgery follow-up and rest")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Original file name shown to reviewers
    pub name: String,
}

/// The caller's wizard together with a fresh balance snapshot.
async fn open_wizard(
    auth: &AuthUser,
    state: &AppState,
) -> actix_web::Result<(WizardHandle, BalanceSnapshot)> {
    let employee_id = auth.employee_id()?;
    let snapshot = state.accounting.snapshot(employee_id).await?;
    Ok((state.wizards.get_or_start(employee_id).await, snapshot))
}

/// Current wizard state
#[utoipa::path(
    get,
    path = "/api/leave/wizard",
    responses(
        (status = 200, description = "Current wizard state", body = WizardState),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn wizard_state(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let wizard = handle.lock().await;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Choose the leave category
#[utoipa::path(
    put,
    path = "/api/leave/wizard/category",
    request_body = CategoryBody,
    responses(
        (status = 200, description = "Category stored", body = WizardState),
        (status = 400, description = "Step not reached or already submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn select_category(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CategoryBody>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    wizard.select_category(payload.category)?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Set the leave period; the day count is derived
#[utoipa::path(
    put,
    path = "/api/leave/wizard/period",
    request_body = PeriodBody,
    responses(
        (status = 200, description = "Period stored", body = WizardState),
        (status = 400, description = "Step not reached or already submitted"),
        (status = 422, description = "End date before start date")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn set_period(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<PeriodBody>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    wizard.set_period(payload.start_date, payload.end_date)?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Set the reason text
#[utoipa::path(
    put,
    path = "/api/leave/wizard/reason",
    request_body = ReasonBody,
    responses(
        (status = 200, description = "Reason stored", body = WizardState),
        (status = 400, description = "Step not reached or already submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn set_reason(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ReasonBody>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    wizard.set_reason(&payload.reason)?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Upload and attach one supporting document
///
/// The request body is the raw file, its `Content-Type` the document type.
#[utoipa::path(
    post,
    path = "/api/leave/wizard/documents",
    params(UploadQuery),
    request_body(content = Vec<u8>, description = "Raw document bytes", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Document attached", body = WizardState),
        (status = 422, description = "Unsupported type or too large"),
        (status = 503, description = "Upload failed, retry")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn upload_document(
    auth: AuthUser,
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let mime_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let meta = DocumentMeta {
        original_name: query.into_inner().name,
        mime_type,
        size_bytes: body.len() as u64,
    };

    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;

    // refuse before any byte reaches storage
    wizard.ensure_editable(WizardStep::AttachDocuments)?;
    if let Err(e) = document_gate::check_document(&meta.original_name, &meta.mime_type, meta.size_bytes) {
        warn!(employee_id = %wizard.employee_id(), error = %e, "Document refused");
        return Err(e.into());
    }

    let storage_ref = state.documents.put(&body, &meta).await?;
    let document = meta.into_document(storage_ref);
    info!(
        employee_id = %wizard.employee_id(),
        storage_ref = %document.storage_ref,
        size = document.size_bytes,
        "Document attached"
    );
    wizard.attach_document(document)?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Detach a document by position
#[utoipa::path(
    delete,
    path = "/api/leave/wizard/documents/{index}",
    params(("index" = usize, Path, description = "Position in the attachment list")),
    responses(
        (status = 200, description = "Document detached", body = WizardState),
        (status = 400, description = "No document at that position")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn remove_document(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<usize>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    let removed = wizard.remove_document(path.into_inner())?;
    if let Err(e) = state.documents.delete(&removed.storage_ref).await {
        warn!(employee_id = %wizard.employee_id(), storage_ref = %removed.storage_ref, error = %e, "Detached document kept");
    }
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Move to the next step if the current one is complete
#[utoipa::path(
    post,
    path = "/api/leave/wizard/advance",
    responses(
        (status = 200, description = "Advanced", body = WizardState),
        (status = 422, description = "Current step incomplete")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn advance(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    wizard.advance(&snapshot)?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Go back one step, keeping entered data
#[utoipa::path(
    post,
    path = "/api/leave/wizard/back",
    responses(
        (status = 200, description = "Moved back", body = WizardState),
        (status = 400, description = "Already at the first step")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn back(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    wizard.back()?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Jump back to any step already reached
#[utoipa::path(
    post,
    path = "/api/leave/wizard/revisit/{step}",
    params(("step" = String, Path, description = "Step name, e.g. select_period")),
    responses(
        (status = 200, description = "Moved", body = WizardState),
        (status = 400, description = "Step not reached yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn revisit(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<WizardStep>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    wizard.revisit(path.into_inner())?;
    Ok(HttpResponse::Ok().json(wizard.state(&snapshot)))
}

/// Submit the reviewed draft as a Pending request
#[utoipa::path(
    post,
    path = "/api/leave/wizard/submit",
    responses(
        (status = 201, description = "Leave request submitted", body = WizardState),
        (status = 400, description = "Not at the review step"),
        (status = 422, description = "A step became invalid"),
        (status = 503, description = "Store unavailable, draft kept")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn submit(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let (handle, snapshot) = open_wizard(&auth, &state).await?;
    let mut wizard = handle.lock().await;
    let now = state.accounting.clock().now();
    wizard.submit(&snapshot, state.store.as_ref(), now).await?;
    Ok(HttpResponse::Created().json(wizard.state(&snapshot)))
}

/// Discard the draft and start over
#[utoipa::path(
    delete,
    path = "/api/leave/wizard",
    responses((status = 204, description = "Draft discarded")),
    security(("bearer_auth" = [])),
    tag = "Leave wizard"
)]
pub async fn reset(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    state.wizards.discard(employee_id).await;
    Ok(HttpResponse::NoContent().finish())
}
