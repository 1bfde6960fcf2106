use super::{db_error, login_redirect};
use crate::middleware::ClientCtx;
use crate::paginator::{paginate, Page, PageQuery, Paginator};
use crate::post::{select_feed_for_user, PostForTemplate};
use crate::session::MainData;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_follow_feed);
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub client: ClientCtx,
    pub page: Page<PostForTemplate>,
    pub paginator: Paginator,
}

/// Posts from followed authors.
#[get("/follow/")]
async fn view_follow_feed(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect(&req)),
    };

    let page = paginate(
        select_feed_for_user(user_id).into_model::<PostForTemplate>(),
        &data.db,
        query.number(),
    )
    .await
    .map_err(db_error)?;
    let paginator = page.paginator("/follow/");

    Ok(FollowTemplate {
        client,
        page,
        paginator,
    }
    .to_response())
}
