use crate::config::Settings;
use crate::filesystem::MAX_UPLOAD_SIZE;
use crate::middleware::ClientCtxResolver;
use crate::session::{session_key, session_middleware, MainData};
use crate::web::error::{render_404, render_500, view_not_found};
use actix_web::body::MessageBody;
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{web, App, Error, HttpServer};
use anyhow::Context;

/// Bodies are buffered up to this size before multipart parsing.
const MAX_PAYLOAD_SIZE: usize = MAX_UPLOAD_SIZE + 256 * 1024;

/// Builds the application. Shared by the server and the integration tests.
pub fn app(
    data: web::Data<MainData>,
    key: Key,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let sessions = session_middleware(&data.settings, key);

    // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
    App::new()
        .app_data(data)
        .app_data(web::PayloadConfig::new(MAX_PAYLOAD_SIZE))
        .wrap(
            ErrorHandlers::new()
                .handler(StatusCode::NOT_FOUND, render_404)
                .handler(StatusCode::INTERNAL_SERVER_ERROR, render_500),
        )
        .wrap(ClientCtxResolver)
        .wrap(sessions)
        .wrap(Logger::new("%a \"%r\" %s %b %T"))
        .configure(crate::web::configure)
        .default_service(web::to(view_not_found))
}

/// Runs the HTTP server until it is stopped.
pub async fn start(data: MainData) -> anyhow::Result<()> {
    let key = session_key(&data.settings);
    let bind_address = data.settings.bind_address.to_owned();
    let data = web::Data::new(data);

    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || app(data.clone(), key.clone()))
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await
        .context("server stopped with an error")
}

/// Prepares the media root for uploads.
pub fn ensure_media_root(settings: &Settings) -> anyhow::Result<()> {
    let media_root = &settings.media_root;
    if !media_root.exists() {
        std::fs::DirBuilder::new()
            .recursive(true)
            .create(media_root)
            .with_context(|| format!("failed to create MEDIA_ROOT {}", media_root.display()))?;
    }
    Ok(())
}
