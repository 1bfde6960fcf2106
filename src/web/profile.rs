use super::{db_error, login_redirect, redirect};
use crate::follow::{follow_author, is_following, unfollow_author};
use crate::middleware::ClientCtx;
use crate::orm::{posts, users};
use crate::paginator::{paginate, Page, PageQuery, Paginator};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::session::MainData;
use crate::user::get_user_by_name;
use actix_web::{error, get, route, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*, DatabaseConnection};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_profile)
        .service(follow_profile)
        .service(unfollow_profile);
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub client: ClientCtx,
    pub author: users::Model,
    pub post_count: u64,
    /// Whether the viewer follows this author. Always false for guests and the author.
    pub following: bool,
    pub page: Page<PostForTemplate>,
    pub paginator: Paginator,
}

async fn find_author(db: &DatabaseConnection, username: &str) -> Result<users::Model, Error> {
    get_user_by_name(db, username)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))
}

#[get("/profile/{username}/")]
async fn view_profile(
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let author = find_author(&data.db, &path).await?;

    let page = paginate(
        select_posts_for_template()
            .filter(posts::Column::AuthorId.eq(author.id))
            .into_model::<PostForTemplate>(),
        &data.db,
        query.number(),
    )
    .await
    .map_err(db_error)?;
    let paginator = page.paginator(&format!("/profile/{}/", author.username));

    let following = match client.get_id() {
        Some(id) if client.can_follow(&author.id) => is_following(&data.db, id, author.id)
            .await
            .map_err(db_error)?,
        _ => false,
    };

    Ok(ProfileTemplate {
        client,
        post_count: page.count,
        author,
        following,
        page,
        paginator,
    }
    .to_response())
}

#[route("/profile/{username}/follow/", method = "GET", method = "POST")]
async fn follow_profile(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect(&req)),
    };
    let author = find_author(&data.db, &path).await?;

    if follow_author(&data.db, user_id, author.id)
        .await
        .map_err(db_error)?
    {
        log::info!("{} follows {}", client.get_name(), author.username);
    } else {
        log::debug!(
            "follow_profile: nothing to do for {} -> {}",
            client.get_name(),
            author.username
        );
    }

    Ok(redirect("/follow/"))
}

#[route("/profile/{username}/unfollow/", method = "GET", method = "POST")]
async fn unfollow_profile(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect(&req)),
    };
    let author = find_author(&data.db, &path).await?;

    if unfollow_author(&data.db, user_id, author.id)
        .await
        .map_err(db_error)?
    {
        log::info!("{} unfollowed {}", client.get_name(), author.username);
    }

    Ok(redirect("/follow/"))
}
