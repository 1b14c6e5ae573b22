use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{access_token_cookie, removal_cookie, AccessToken},
    errors::{AppError, AuthError},
    handlers::form_or_json,
    models::dto::{
        request::{LoginUserRequest, RegisterUserRequest},
        response::{LoginResponse, UserResponse},
    },
};

#[post("/api/registerUser")]
async fn register_user(
    state: web::Data<AppState>,
    body: web::Either<web::Form<RegisterUserRequest>, web::Json<RegisterUserRequest>>,
) -> Result<HttpResponse, AppError> {
    let user = state.auth_service.register(form_or_json(body)).await?;
    Ok(HttpResponse::Ok().json(UserResponse { user: Some(user) }))
}

#[post("/api/loginUser")]
async fn login_user(
    state: web::Data<AppState>,
    body: web::Either<web::Form<LoginUserRequest>, web::Json<LoginUserRequest>>,
) -> Result<HttpResponse, AppError> {
    match state.auth_service.login(form_or_json(body)).await {
        Ok((user, session)) => Ok(HttpResponse::Ok()
            .cookie(access_token_cookie(&session))
            .json(LoginResponse { user, session })),
        Err(AppError::Auth(AuthError::EmailNotConfirmed)) => {
            Ok(HttpResponse::Ok().json(json!({ "error": "confirm_email" })))
        }
        Err(e) => Err(e),
    }
}

#[get("/api/fetchUser")]
async fn fetch_user(
    state: web::Data<AppState>,
    token: AccessToken,
) -> Result<HttpResponse, AppError> {
    match state.auth_service.current_user(&token.0).await {
        Ok(user) => Ok(HttpResponse::Ok().json(UserResponse { user: Some(user) })),
        Err(AppError::Auth(AuthError::TokenExpired)) => {
            Ok(HttpResponse::Ok().json(UserResponse { user: None }))
        }
        Err(e) => Err(e),
    }
}

/// Clears the cookie even when the provider cannot be reached.
#[post("/api/logoutUser")]
async fn logout_user(state: web::Data<AppState>, token: Option<AccessToken>) -> HttpResponse {
    if let Some(AccessToken(token)) = token {
        if let Err(e) = state.auth_service.logout(&token).await {
            log::warn!("Provider logout failed: {}", e);
        }
    }
    HttpResponse::Ok().cookie(removal_cookie()).finish()
}
