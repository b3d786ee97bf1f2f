//! Sign-up, login and logout.

use std::sync::Arc;

use actix_web::cookie::{Cookie, time::Duration as CookieDuration};
use actix_web::{HttpResponse, web};
use serde::Serialize;

use yatube_core::domain::User;
use yatube_core::error::RepoError;
use yatube_core::forms::{FormErrors, SignupForm, USERNAME_TAKEN_MESSAGE};
use yatube_core::ports::{BaseRepository, PasswordService, TokenService};
use yatube_shared::dto::{LoginRequest, NextQuery, SignupRequest};

use crate::middleware::auth::ACCESS_TOKEN_COOKIE;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::View;

const INVALID_LOGIN_MESSAGE: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Serialize)]
struct AuthFormContext {
    username: String,
    errors: FormErrors,
    next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

fn signed_in(
    token_service: &dyn TokenService,
    user: &User,
    next: Option<&str>,
) -> AppResult<HttpResponse> {
    let token = token_service.generate_token(user.id, &user.username)?;
    let cookie = Cookie::build(ACCESS_TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(token_service.expiration_seconds()))
        .finish();

    Ok(HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, safe_next(next)))
        .cookie(cookie)
        .finish())
}

fn form_view(
    template: &'static str,
    username: String,
    errors: FormErrors,
    next: Option<String>,
) -> AppResult<HttpResponse> {
    let view = View::new(
        template,
        AuthFormContext {
            username,
            errors,
            next,
        },
    )?;
    Ok(view.into_response())
}

/// GET /auth/signup/
pub async fn signup_form() -> AppResult<HttpResponse> {
    form_view("users/signup.html", String::new(), FormErrors::default(), None)
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Form<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let form = SignupForm {
        username: req.username,
        password: req.password,
    };

    let mut errors = form.validate().err().unwrap_or_default();
    if errors.field("username").is_empty()
        && state.users.find_by_username(&form.username).await?.is_some()
    {
        errors.add("username", USERNAME_TAKEN_MESSAGE);
    }
    if !errors.is_empty() {
        return form_view("users/signup.html", form.username, errors, None);
    }

    let password_hash = password_service.hash(&form.password)?;
    let user = match state.users.insert(User::new(form.username, password_hash)).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN_MESSAGE);
            return form_view("users/signup.html", String::new(), errors, None);
        }
        Err(e) => return Err(AppError::from(e)),
    };
    tracing::info!(user = %user.username, "User signed up");

    signed_in(token_service.get_ref().as_ref(), &user, None)
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> AppResult<HttpResponse> {
    form_view(
        "users/login.html",
        String::new(),
        FormErrors::default(),
        query.into_inner().next,
    )
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Form<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state.users.find_by_username(&req.username).await?;
    let valid = match &user {
        Some(user) => password_service.verify(&req.password, &user.password_hash)?,
        None => false,
    };

    match user {
        Some(user) if valid => {
            tracing::debug!(user = %user.username, "User logged in");
            signed_in(token_service.get_ref().as_ref(), &user, req.next.as_deref())
        }
        _ => {
            let mut errors = FormErrors::default();
            errors.add("__all__", INVALID_LOGIN_MESSAGE);
            form_view("users/login.html", req.username, errors, req.next)
        }
    }
}

/// GET /auth/logout/
pub async fn logout() -> AppResult<HttpResponse> {
    let mut cookie = Cookie::build(ACCESS_TOKEN_COOKIE, "").path("/").finish();
    cookie.make_removal();

    let mut response = View::new("users/logged_out.html", serde_json::json!({}))?.into_response();
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/create/")), "/create/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
