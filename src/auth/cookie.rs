use std::future::{ready, Ready};

use actix_web::{
    cookie::{time::OffsetDateTime, Cookie, SameSite},
    FromRequest, HttpRequest,
};

use crate::{
    errors::{AppError, AuthError},
    models::domain::AuthSession,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Http-only cookie carrying the provider's access token until it expires.
pub fn access_token_cookie(session: &AuthSession) -> Cookie<'static> {
    let mut cookie = Cookie::build(ACCESS_TOKEN_COOKIE, session.access_token.clone())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .finish();

    if let Some(expires) = session
        .expires_at
        .and_then(|at| OffsetDateTime::from_unix_timestamp(at).ok())
    {
        cookie.set_expires(expires);
    }
    cookie
}

/// Expired replacement that makes the browser drop the access token.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(ACCESS_TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

/// Extractor for the access token cookie.
pub struct AccessToken(pub String);

impl FromRequest for AccessToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let token = req
            .cookie(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(AppError::Auth(AuthError::MissingToken));

        ready(token.map(AccessToken))
    }
}
