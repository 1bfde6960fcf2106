use super::db_error;
use crate::cache::{PageCache, INDEX_CACHE_PREFIX};
use crate::middleware::ClientCtx;
use crate::paginator::{paginate, Page, PageQuery, Paginator};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::session::MainData;
use actix_web::http::header::{self, CacheControl, CacheDirective, ContentType};
use actix_web::web::{self, Bytes};
use actix_web::{error, get, Error, HttpRequest, HttpResponse};
use askama_actix::Template;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
    pub paginator: Paginator,
}

/// Shared caches key on the session cookie. Pages of signed in users are private.
fn cached_response(body: Bytes, ttl_secs: u64, is_user: bool) -> HttpResponse {
    let mut directives = vec![CacheDirective::MaxAge(ttl_secs as u32)];
    if is_user {
        directives.push(CacheDirective::Private);
    }
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .insert_header(CacheControl(directives))
        .insert_header((header::VARY, "Cookie"))
        .body(body)
}

/// Every post, newest first. Rendered pages are reused for the cache lifetime.
#[get("/")]
async fn view_index(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let full_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let key = PageCache::key(INDEX_CACHE_PREFIX, full_path, client.get_id());
    let ttl_secs = data.cache.ttl().as_secs();

    if let Some(body) = data.cache.get(&key) {
        log::debug!("view_index: cache hit for {}", key);
        return Ok(cached_response(body, ttl_secs, client.is_user()));
    }

    let page = paginate(
        select_posts_for_template().into_model::<PostForTemplate>(),
        &data.db,
        query.number(),
    )
    .await
    .map_err(db_error)?;
    let paginator = page.paginator("/");

    let is_user = client.is_user();
    let body = IndexTemplate {
        client,
        page,
        paginator,
    }
    .render()
    .map_err(error::ErrorInternalServerError)?;

    let body = Bytes::from(body);
    data.cache.insert(key, body.clone());
    Ok(cached_response(body, ttl_secs, is_user))
}
