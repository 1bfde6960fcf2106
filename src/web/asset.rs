use crate::session::MainData;
use actix_files as fs;
use actix_web::{error, get, web, Error, HttpRequest};
use std::path::{Component, Path};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_media);
}

/// Serves uploaded files out of the media root.
#[get("/media/{filename:.*}")]
async fn view_media(req: HttpRequest, data: web::Data<MainData>) -> Result<fs::NamedFile, Error> {
    let req_path = Path::new(req.match_info().query("filename"));

    // Only plain names below the media root; no `..`, no absolute paths.
    if req_path.as_os_str().is_empty()
        || !req_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(error::ErrorNotFound("File not found."));
    }

    let file = fs::NamedFile::open(data.settings.media_root.join(req_path))?;

    Ok(file.use_last_modified(true))
}
