use crate::middleware::ClientCtx;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, header::HeaderValue, StatusCode};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpMessage, HttpResponse, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "core/404.html")]
struct NotFoundTemplate<'a> {
    client: ClientCtx,
    path: &'a str,
}

#[derive(Template)]
#[template(path = "core/500.html")]
struct ServerErrorTemplate {
    client: ClientCtx,
    status: StatusCode,
}

/// Replaces the body of an error response with an HTML document.
fn error_document<B>(res: ServiceResponse<B>, document: String) -> Result<ErrorHandlerResponse<B>> {
    let body = BoxBody::new(document);
    let mut res: ServiceResponse<EitherBody<B>> =
        res.map_body(|_, _| EitherBody::<B, BoxBody>::right(body));

    // Headers must be manually set because Actix-Web renders no content by default.
    let headers = res.response_mut().headers_mut();
    // Web document
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    // Proxies love to cache error pages permanently. Explicitly say not to do that.
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(ErrorHandlerResponse::Response(res))
}

/// The client as resolved for this request, if the resolver ran.
fn client_of<B>(res: &ServiceResponse<B>) -> ClientCtx {
    res.request()
        .extensions()
        .get::<ClientCtx>()
        .cloned()
        .unwrap_or_default()
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let document = NotFoundTemplate {
        client: client_of(&res),
        path: res.request().path(),
    }
    .to_string();
    error_document::<B>(res, document)
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if let Some(e) = res.response().error() {
        log::error!("500 on {}: {}", res.request().path(), e);
    }
    let document = ServerErrorTemplate {
        client: client_of(&res),
        status: res.status(),
    }
    .to_string();
    error_document::<B>(res, document)
}

/// Fallback for paths no route matched.
pub async fn view_not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}
