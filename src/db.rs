use crate::orm::{comments, follows, groups, posts, users};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

/// Opens a connection pool for the database URL.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());

    // Every connection to an in-memory SQLite database sees its own database.
    if database_url.starts_with("sqlite::memory:") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(100)
            .min_connections(5)
            .idle_timeout(Duration::from_secs(8));
    }

    opt.connect_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    Database::connect(opt).await
}

/// Creates the tables described by our entities if they do not exist yet.
/// Order matters; referenced tables come first.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, groups::Entity).await?;
    create_table(db, &schema, posts::Entity).await?;
    create_table(db, &schema, comments::Entity).await?;
    create_table(db, &schema, follows::Entity).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    log::debug!("Creating table if missing: {}", entity.table_name());

    let backend = db.get_database_backend();
    let stmt = schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
