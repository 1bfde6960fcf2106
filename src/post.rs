use crate::orm::{comments, follows, groups, posts, users};
use chrono::prelude::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult, PaginatorTrait,
};

/// A fully joined struct representing the post model and its relational data.
#[derive(Debug, FromQueryResult)]
pub struct PostForTemplate {
    pub id: i32,
    pub text: String,
    pub pub_date: chrono::NaiveDateTime,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub image: Option<String>,
    // join users
    pub author_name: String,
    // join groups
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

impl PostForTemplate {
    pub fn excerpt(&self) -> &str {
        crate::orm::truncate_text(&self.text)
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| format!("/media/{}", path))
    }

    pub fn pub_date_display(&self) -> String {
        self.pub_date.format("%d %B %Y").to_string()
    }

    pub fn url(&self) -> String {
        format!("/posts/{}/", self.id)
    }
}

#[derive(Debug, FromQueryResult)]
pub struct CommentForTemplate {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub created: chrono::NaiveDateTime,
    // join users
    pub author_name: String,
}

impl CommentForTemplate {
    pub fn created_display(&self) -> String {
        self.created.format("%d %B %Y %H:%M").to_string()
    }
}

/// Post query joined with author and group, newest first.
/// Callers add their own filters before `into_model`.
pub fn select_posts_for_template() -> Select<posts::Entity> {
    posts::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "author_name")
        .left_join(groups::Entity)
        .column_as(groups::Column::Title, "group_title")
        .column_as(groups::Column::Slug, "group_slug")
        .order_by_desc(posts::Column::PubDate)
        .order_by_desc(posts::Column::Id)
}

/// Posts by every author `user_id` follows.
pub fn select_feed_for_user(user_id: i32) -> Select<posts::Entity> {
    select_posts_for_template().filter(
        posts::Column::AuthorId.in_subquery(
            Query::select()
                .column(follows::Column::AuthorId)
                .from(follows::Entity)
                .and_where(follows::Column::UserId.eq(user_id))
                .to_owned(),
        ),
    )
}

pub async fn get_post_for_template(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<PostForTemplate>, DbErr> {
    select_posts_for_template()
        .filter(posts::Column::Id.eq(id))
        .into_model::<PostForTemplate>()
        .one(db)
        .await
}

/// Comments on a post, most recent first.
pub async fn get_comments_for_post(
    db: &DatabaseConnection,
    post_id: i32,
) -> Result<Vec<CommentForTemplate>, DbErr> {
    comments::Entity::find()
        .filter(comments::Column::PostId.eq(post_id))
        .left_join(users::Entity)
        .column_as(users::Column::Username, "author_name")
        .order_by_desc(comments::Column::Created)
        .order_by_desc(comments::Column::Id)
        .into_model::<CommentForTemplate>()
        .all(db)
        .await
}

pub async fn count_posts_by_author(db: &DatabaseConnection, author_id: i32) -> Result<u64, DbErr> {
    posts::Entity::find()
        .filter(posts::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

/// Every group, for the post form's choice list.
pub async fn get_group_choices(db: &DatabaseConnection) -> Result<Vec<groups::Model>, DbErr> {
    groups::Entity::find()
        .order_by_asc(groups::Column::Title)
        .all(db)
        .await
}

pub async fn insert_post(
    db: &DatabaseConnection,
    author_id: i32,
    text: String,
    group_id: Option<i32>,
    image: Option<String>,
) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        text: Set(text),
        pub_date: Set(Utc::now().naive_utc()),
        author_id: Set(author_id),
        group_id: Set(group_id),
        image: Set(image),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Replaces text and group. The image changes only when a new one is given.
pub async fn update_post(
    db: &DatabaseConnection,
    post: posts::Model,
    text: String,
    group_id: Option<i32>,
    image: Option<String>,
) -> Result<posts::Model, DbErr> {
    let mut active: posts::ActiveModel = post.into();
    active.text = Set(text);
    active.group_id = Set(group_id);
    if image.is_some() {
        active.image = Set(image);
    }
    active.update(db).await
}

pub async fn insert_comment(
    db: &DatabaseConnection,
    post_id: i32,
    author_id: i32,
    text: String,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(author_id),
        text: Set(text),
        created: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
