use anyhow::Context;
use env_logger::Env;
use yatube::config::Settings;
use yatube::init::{ensure_media_root, start};
use yatube::session::MainData;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let settings = Settings::from_env()?;
    ensure_media_root(&settings)?;

    let db = yatube::db::connect(&settings.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    yatube::db::create_tables(&db)
        .await
        .context("failed to create tables")?;

    start(MainData::new(db, settings)).await
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env file is fine; the environment may already be set.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
