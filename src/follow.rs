use crate::orm::follows;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};

pub async fn is_following(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follows::Entity::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some())
}

/// Creates the edge `user_id -> author_id` unless it exists.
/// Following oneself does nothing. Returns whether a row was written.
pub async fn follow_author(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    if user_id == author_id {
        return Ok(false);
    }

    let inserted = follows::Entity::insert(follows::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
    })
    .on_conflict(
        OnConflict::columns([follows::Column::UserId, follows::Column::AuthorId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    Ok(inserted > 0)
}

/// Removes the edge `user_id -> author_id`. Other followers of the author are untouched.
pub async fn unfollow_author(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    let res = follows::Entity::delete_many()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, create_tables};
    use crate::user::insert_new_user;
    use sea_orm::PaginatorTrait;

    async fn setup() -> (DatabaseConnection, i32, i32, i32) {
        let db = connect("sqlite::memory:").await.expect("connect");
        create_tables(&db).await.expect("schema");
        let a = insert_new_user(&db, "auth", "x").await.expect("user");
        let b = insert_new_user(&db, "reader", "x").await.expect("user");
        let c = insert_new_user(&db, "other", "x").await.expect("user");
        (db, a.id, b.id, c.id)
    }

    async fn edges(db: &DatabaseConnection) -> u64 {
        follows::Entity::find().count(db).await.expect("count")
    }

    #[actix_rt::test]
    async fn test_follow_is_idempotent() {
        let (db, author, reader, _) = setup().await;

        assert!(follow_author(&db, reader, author).await.expect("follow"));
        assert!(!follow_author(&db, reader, author).await.expect("follow"));
        assert_eq!(edges(&db).await, 1);
        assert!(is_following(&db, reader, author).await.expect("query"));
        assert!(!is_following(&db, author, reader).await.expect("query"));
    }

    #[actix_rt::test]
    async fn test_self_follow_is_ignored() {
        let (db, author, _, _) = setup().await;

        assert!(!follow_author(&db, author, author).await.expect("follow"));
        assert_eq!(edges(&db).await, 0);
    }

    #[actix_rt::test]
    async fn test_unfollow_removes_only_own_edge() {
        let (db, author, reader, other) = setup().await;
        follow_author(&db, reader, author).await.expect("follow");
        follow_author(&db, other, author).await.expect("follow");

        assert!(unfollow_author(&db, reader, author).await.expect("unfollow"));
        assert!(!unfollow_author(&db, reader, author).await.expect("unfollow"));
        assert!(is_following(&db, other, author).await.expect("query"));
        assert_eq!(edges(&db).await, 1);
    }
}
