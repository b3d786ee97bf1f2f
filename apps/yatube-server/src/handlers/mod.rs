//! HTTP handlers and route configuration.

mod auth;
mod context;
mod feed;
mod follow;
mod posts;


use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::middleware::error::{AppError, AppResult};

/// Body limit of the comment form, in line with multipart text fields.
const COMMENT_FORM_LIMIT: usize = 2 * 1024 * 1024;

/// 302 to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Fallback for every unmatched route.
async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("no page at {}", req.path())))
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(feed::index))
        .route("/group/{slug}/", web::get().to(feed::group_posts))
        .route("/follow/", web::get().to(feed::follow_index))
        .route("/profile/{username}/", web::get().to(feed::profile))
        .route(
            "/profile/{username}/follow/",
            web::get().to(follow::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(follow::profile_unfollow),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit_submit)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/")
                .app_data(web::FormConfig::default().limit(COMMENT_FORM_LIMIT))
                .route(web::post().to(posts::add_comment)),
        )
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create_submit)),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::get().to(auth::logout)),
        )
        .default_service(web::to(not_found));
}
