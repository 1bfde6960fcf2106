use super::db_error;
use crate::middleware::ClientCtx;
use crate::orm::{groups, posts};
use crate::paginator::{paginate, Page, PageQuery, Paginator};
use crate::post::{select_posts_for_template, PostForTemplate};
use crate::session::MainData;
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_group);
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupTemplate {
    pub client: ClientCtx,
    pub group: groups::Model,
    pub page: Page<PostForTemplate>,
    pub paginator: Paginator,
}

#[get("/group/{slug}/")]
async fn view_group(
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let group = groups::Entity::find()
        .filter(groups::Column::Slug.eq(path.into_inner()))
        .one(&data.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Group not found."))?;

    let page = paginate(
        select_posts_for_template()
            .filter(posts::Column::GroupId.eq(group.id))
            .into_model::<PostForTemplate>(),
        &data.db,
        query.number(),
    )
    .await
    .map_err(db_error)?;
    let paginator = page.paginator(&format!("/group/{}/", group.slug));

    Ok(GroupTemplate {
        client,
        group,
        page,
        paginator,
    }
    .to_response())
}
