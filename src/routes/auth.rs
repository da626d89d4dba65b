use crate::auth::{AuthService, ADMIN_COOKIE};
use crate::error::{ApiError, MessageResponse};
use actix_web::{get, post, web, HttpMessage, HttpRequest, HttpResponse};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub is_admin: bool,
}

#[post("/auth/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    data: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let password = match data.into_inner().password {
        Some(password) if !password.is_empty() => password,
        _ => return Err(ApiError::BadRequest("Password is required".to_owned())),
    };
    // bcrypt is CPU bound
    let service = auth.clone();
    let valid = web::block(move || Ok::<_, ()>(service.verify_password(&password)))
        .await
        .map_err(|e| {
            error!("Password check did not complete: {:?}", e);
            ApiError::Internal("Login failed".to_owned())
        })?;
    if !valid {
        warn!("Rejected admin login attempt");
        return Err(ApiError::Unauthorized("Invalid password".to_owned()));
    }
    let token = auth.issue_token().map_err(|e| {
        error!("Failed to sign admin token: {}", e);
        ApiError::Internal("Login failed".to_owned())
    })?;
    info!("Admin logged in");
    Ok(HttpResponse::Ok()
        .cookie(auth.session_cookie(token))
        .json(MessageResponse::new("Login successful")))
}

#[post("/auth/logout")]
pub async fn logout(auth: web::Data<AuthService>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(auth.removal_cookie())
        .json(MessageResponse::new("Logged out successfully"))
}

/// Answers 401 with `isAdmin: false` instead of an error body, and drops a
/// cookie that no longer verifies.
#[get("/auth/check")]
pub async fn check(req: HttpRequest, auth: web::Data<AuthService>) -> HttpResponse {
    let cookie = match req.cookie(ADMIN_COOKIE) {
        Some(cookie) => cookie,
        None => return HttpResponse::Unauthorized().json(CheckResponse { is_admin: false }),
    };
    match auth.verify_token(cookie.value()) {
        Some(claims) if claims.is_admin() => HttpResponse::Ok().json(CheckResponse { is_admin: true }),
        _ => HttpResponse::Unauthorized()
            .cookie(auth.removal_cookie())
            .json(CheckResponse { is_admin: false }),
    }
}
