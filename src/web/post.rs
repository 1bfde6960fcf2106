use super::{db_error, login_redirect, redirect};
use crate::filesystem::{read_post_multipart, save_post_image, UploadError};
use crate::form::{
    clean_comment, clean_post, CleanPost, CommentFormData, FormErrors, PostForm, PostSubmission,
};
use crate::middleware::ClientCtx;
use crate::orm::{groups, posts};
use crate::post::{
    count_posts_by_author, get_comments_for_post, get_group_choices, get_post_for_template,
    insert_comment, insert_post, update_post, CommentForTemplate, PostForTemplate,
};
use crate::session::MainData;
use actix_multipart::Multipart;
use actix_web::{error, get, post, web, Either, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, DatabaseConnection};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_post)
        .service(view_create_post)
        .service(create_post)
        .service(edit_post)
        .service(update_post_form)
        .service(add_comment);
}

/// Post forms arrive url-encoded, or as multipart when an image is attached.
type PostPayload = Either<web::Form<PostSubmission>, Multipart>;

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub client: ClientCtx,
    pub post: PostForTemplate,
    /// Posts written by this post's author.
    pub post_count: u64,
    pub comments: Vec<CommentForTemplate>,
    pub comment_form: CommentFormData,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub client: ClientCtx,
    pub form: PostForm,
    pub is_edit: bool,
    /// Where the form submits to.
    pub action: String,
}

fn post_url(id: i32) -> String {
    format!("/posts/{}/", id)
}

fn edit_url(id: i32) -> String {
    format!("/posts/{}/edit/", id)
}

async fn read_submission(payload: PostPayload) -> Result<PostSubmission, UploadError> {
    match payload {
        Either::Left(form) => Ok(form.into_inner()),
        Either::Right(multipart) => read_post_multipart(multipart).await,
    }
}

/// Validation decodes any uploaded image, so it runs on the blocking pool.
/// The group choices are handed back for re-rendering the form.
async fn validate_submission(
    submission: PostSubmission,
    groups: Vec<groups::Model>,
) -> Result<(Result<CleanPost, FormErrors>, Vec<groups::Model>), Error> {
    web::block(move || {
        let clean = clean_post(submission, &groups);
        (clean, groups)
    })
    .await
    .map_err(error::ErrorInternalServerError)
}

async fn find_post(db: &DatabaseConnection, id: i32) -> Result<posts::Model, Error> {
    posts::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))
}

#[get("/posts/{post_id}/")]
async fn view_post(
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let db = &data.db;
    let post = get_post_for_template(db, path.into_inner())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))?;
    let comments = get_comments_for_post(db, post.id)
        .await
        .map_err(db_error)?;
    let post_count = count_posts_by_author(db, post.author_id)
        .await
        .map_err(db_error)?;
    let can_edit = client.can_update_post(post.author_id);

    Ok(PostDetailTemplate {
        client,
        post,
        post_count,
        comments,
        comment_form: CommentFormData::default(),
        can_edit,
    }
    .to_response())
}

#[get("/create/")]
async fn view_create_post(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(login_redirect(&req));
    }

    let groups = get_group_choices(&data.db).await.map_err(db_error)?;

    Ok(PostFormTemplate {
        client,
        form: PostForm::blank(groups),
        is_edit: false,
        action: "/create/".to_owned(),
    }
    .to_response())
}

#[post("/create/")]
async fn create_post(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    payload: PostPayload,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect(&req)),
    };

    let submission = read_submission(payload).await?;
    let groups = get_group_choices(&data.db).await.map_err(db_error)?;
    let (text, group) = (submission.text.to_owned(), submission.group.to_owned());

    let (clean, groups) = validate_submission(submission, groups).await?;
    let clean = match clean {
        Ok(clean) => clean,
        Err(errors) => {
            return Ok(PostFormTemplate {
                client,
                form: PostForm::rejected(text, group, errors, groups),
                is_edit: false,
                action: "/create/".to_owned(),
            }
            .to_response())
        }
    };

    let image = match clean.image {
        Some(file) => Some(save_post_image(&data.settings.media_root, file).await?),
        None => None,
    };
    let post = insert_post(&data.db, user_id, clean.text, clean.group_id, image)
        .await
        .map_err(db_error)?;
    log::info!("{} created post {}", client.get_name(), post.id);

    Ok(redirect(&format!("/profile/{}/", client.get_name())))
}

#[get("/posts/{post_id}/edit/")]
async fn edit_post(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(login_redirect(&req));
    }

    let post = find_post(&data.db, path.into_inner()).await?;
    if !client.can_update_post(post.author_id) {
        log::debug!("edit_post: {} is not the author of {}", client.get_name(), post.id);
        return Ok(redirect(&post_url(post.id)));
    }

    let groups = get_group_choices(&data.db).await.map_err(db_error)?;

    Ok(PostFormTemplate {
        client,
        action: edit_url(post.id),
        form: PostForm::for_post(&post, groups),
        is_edit: true,
    }
    .to_response())
}

#[post("/posts/{post_id}/edit/")]
async fn update_post_form(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<i32>,
    payload: PostPayload,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(login_redirect(&req));
    }

    let post = find_post(&data.db, path.into_inner()).await?;
    if !client.can_update_post(post.author_id) {
        log::debug!("update_post_form: {} is not the author of {}", client.get_name(), post.id);
        return Ok(redirect(&post_url(post.id)));
    }

    let submission = read_submission(payload).await?;
    let groups = get_group_choices(&data.db).await.map_err(db_error)?;
    let (text, group) = (submission.text.to_owned(), submission.group.to_owned());

    let (clean, groups) = validate_submission(submission, groups).await?;
    let clean = match clean {
        Ok(clean) => clean,
        Err(errors) => {
            let mut form = PostForm::rejected(text, group, errors, groups);
            form.image = post.image.to_owned();
            return Ok(PostFormTemplate {
                client,
                action: edit_url(post.id),
                form,
                is_edit: true,
            }
            .to_response());
        }
    };

    let image = match clean.image {
        Some(file) => Some(save_post_image(&data.settings.media_root, file).await?),
        None => None,
    };
    let post = update_post(&data.db, post, clean.text, clean.group_id, image)
        .await
        .map_err(db_error)?;
    log::info!("{} edited post {}", client.get_name(), post.id);

    Ok(redirect(&post_url(post.id)))
}

/// Invalid or missing comment bodies are dropped without a word.
#[post("/posts/{post_id}/comment/")]
async fn add_comment(
    req: HttpRequest,
    client: ClientCtx,
    data: web::Data<MainData>,
    path: web::Path<i32>,
    form: Option<web::Form<CommentFormData>>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(login_redirect(&req)),
    };

    let post = find_post(&data.db, path.into_inner()).await?;

    match form.as_deref().map(clean_comment) {
        Some(Ok(text)) => {
            let comment = insert_comment(&data.db, post.id, user_id, text)
                .await
                .map_err(db_error)?;
            log::info!("{} commented {} on post {}", client.get_name(), comment.id, post.id);
        }
        _ => log::debug!("add_comment: dropping invalid comment on post {}", post.id),
    }

    Ok(redirect(&post_url(post.id)))
}
