pub mod account;
pub mod asset;
pub mod error;
pub mod follow;
pub mod group;
pub mod index;
pub mod post;
pub mod profile;

use actix_web::http::header;
use actix_web::{error as web_error, Error, HttpRequest, HttpResponse};
use sea_orm::DbErr;

/// Path of the login form.
pub const LOGIN_URL: &str = "/auth/login/";

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Services are matched top->down; higher traffic routes go first.
    index::configure(conf);
    post::configure(conf);
    group::configure(conf);
    profile::configure(conf);
    follow::configure(conf);
    account::configure(conf);
    asset::configure(conf);
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Sends a guest to the login form, remembering where they were going.
pub fn login_redirect(req: &HttpRequest) -> HttpResponse {
    let full_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let next: String = url::form_urlencoded::byte_serialize(full_path.as_bytes()).collect();
    redirect(&format!("{}?next={}", LOGIN_URL, next))
}

/// Logs a store failure and turns it into a 500.
pub fn db_error(e: DbErr) -> Error {
    log::error!("database error: {}", e);
    web_error::ErrorInternalServerError(e)
}
