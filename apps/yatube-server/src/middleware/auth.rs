//! Authentication extractors.
//!
//! Handlers that require a signed-in user take an [`Identity`]; anonymous
//! requests never reach them and are redirected to the login page with the
//! original path in `next`.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use uuid::Uuid;

use yatube_core::ports::{AuthError, TokenClaims, TokenService};

use crate::state::AppState;

/// Cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

const DEFAULT_LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Rejection of an anonymous request: a 302 to the login page.
#[derive(Debug)]
pub struct LoginRedirect {
    location: String,
    reason: AuthError,
}

impl std::fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "login required: {}", self.reason)
    }
}

impl ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location.as_str()))
            .finish()
    }
}

/// Percent-encode a return path for `?next=`, keeping slashes readable.
pub fn encode_next(path: &str) -> String {
    urlencoding::encode(path).replace("%2F", "/")
}

fn login_location(req: &HttpRequest) -> String {
    let login_url = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.settings.login_url.clone())
        .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{}?next={}", login_url, encode_next(next))
}

/// Token from `Authorization: Bearer ...`, else from the access-token cookie.
fn bearer_or_cookie(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
        return value
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()));
    }

    req.cookie(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingAuth)
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let token_service = req
        .app_data::<web::Data<Arc<dyn TokenService>>>()
        .ok_or_else(|| {
            tracing::error!("TokenService not found in app data");
            AuthError::InvalidToken("Server configuration error".to_string())
        })?;

    let token = bearer_or_cookie(req)?;
    token_service.validate_token(&token).map(Identity::from)
}

impl FromRequest for Identity {
    type Error = LoginRedirect;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|reason| {
            tracing::debug!(path = %req.path(), %reason, "Redirecting to login");
            LoginRedirect {
                location: login_location(req),
                reason,
            }
        }))
    }
}

/// Identity if the request carries a valid token, anonymous otherwise.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_next_keeps_slashes() {
        assert_eq!(encode_next("/create/"), "/create/");
        assert_eq!(encode_next("/follow/?page=2"), "/follow/%3Fpage%3D2");
    }
}
