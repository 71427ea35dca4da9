use actix_web::error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use serde_json::json;

use crate::auth::jwt::{Claims, verify_token};
use crate::config::Config;
use crate::model::leave_request::{EmployeeId, UserId};
use crate::model::role::Role;

/// Session context of one request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<EmployeeId>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        let role = Role::from_id(claims.role).ok_or("Invalid role")?;
        Ok(Self {
            user_id: UserId(claims.user_id),
            username: claims.sub,
            role,
            employee_id: claims.employee_id.map(EmployeeId),
        })
    }

    pub fn is_chef(&self) -> bool {
        self.role == Role::Chef
    }

    pub fn require_chef(&self) -> actix_web::Result<()> {
        if self.is_chef() {
            Ok(())
        } else {
            Err(ErrorForbidden(json!({"error": "FORBIDDEN", "message": "Chef only"})))
        }
    }

    /// The linked employee record; self-service routes have no fallback identity.
    pub fn employee_id(&self) -> actix_web::Result<EmployeeId> {
        self.employee_id.ok_or_else(|| {
            ErrorForbidden(json!({"error": "FORBIDDEN", "message": "No employee profile"}))
        })
    }

    /// Chefs see every request, employees only their own.
    pub fn can_view(&self, owner: EmployeeId) -> bool {
        self.is_chef() || self.employee_id == Some(owner)
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).map_err(ErrorUnauthorized))
    }
}
