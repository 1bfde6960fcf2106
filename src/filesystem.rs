use crate::form::PostSubmission;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, ResponseError};
use derive_more::Display;
use futures_util::{StreamExt, TryStreamExt};
use image::ImageFormat;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Largest accepted image upload.
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Subdirectory of the media root holding post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// Form values never exceed this many bytes.
const MAX_FIELD_SIZE: usize = 64 * 1024;

#[derive(Debug, Display)]
pub enum UploadError {
    #[display(fmt = "upload exceeds {} bytes", MAX_UPLOAD_SIZE)]
    TooLarge,
    #[display(fmt = "malformed multipart body: {}", _0)]
    Multipart(String),
    #[display(fmt = "could not store upload: {}", _0)]
    Io(std::io::Error),
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Multipart(_) => StatusCode::BAD_REQUEST,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A file received through a multipart form.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Reads the post form fields out of a multipart body.
/// Unknown fields are drained and ignored.
pub async fn read_post_multipart(mut multipart: Multipart) -> Result<PostSubmission, UploadError> {
    let mut submission = PostSubmission::default();

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_owned();
        let filename = disposition.get_filename().map(|f| f.to_owned());

        let limit = if name == "image" {
            MAX_UPLOAD_SIZE
        } else {
            MAX_FIELD_SIZE
        };
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        while let Some(chunk) = field.next().await {
            let bytes = chunk.map_err(|e| UploadError::Multipart(e.to_string()))?;
            if buf.len() + bytes.len() > limit {
                return Err(UploadError::TooLarge);
            }
            buf.extend_from_slice(&bytes);
        }

        match name.as_str() {
            "text" => submission.text = String::from_utf8_lossy(&buf).into_owned(),
            "group" => submission.group = String::from_utf8_lossy(&buf).into_owned(),
            "image" => {
                // Browsers send an empty part with no filename when nothing was picked.
                submission.image = match filename {
                    Some(filename) if !filename.is_empty() => Some(UploadedFile {
                        filename,
                        data: buf,
                    }),
                    _ => None,
                };
            }
            other => log::debug!("read_post_multipart: ignoring field '{}'", other),
        }
    }

    Ok(submission)
}

/// Formats accepted as post images.
const IMAGE_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Gif,
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// True if `data` decodes as one of the accepted image formats.
/// Decoding is CPU bound; call this from the blocking pool.
pub fn is_image(data: &[u8]) -> bool {
    match image::guess_format(data) {
        Ok(format) if IMAGE_FORMATS.contains(&format) => {
            image::load_from_memory_with_format(data, format).is_ok()
        }
        _ => false,
    }
}

/// Reduces a client supplied filename to a safe basename.
pub fn sanitize_filename(filename: &str) -> String {
    let basename = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    let clean: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let clean = clean.trim_start_matches('.');
    if clean.is_empty() {
        "upload".to_owned()
    } else {
        clean.to_owned()
    }
}

/// Inserts a random suffix before the extension: `cat.gif` becomes `cat_a1B2c3D.gif`.
fn alternative_filename(filename: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();

    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", filename, suffix),
    }
}

/// Writes `data` to `dir` under `filename` or, if taken, an alternative name.
/// Returns the name actually used.
fn store_file(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<String> {
    use std::fs::OpenOptions;
    use std::io::{ErrorKind, Write};

    std::fs::create_dir_all(dir)?;

    let mut candidate = filename.to_owned();
    loop {
        let path: PathBuf = dir.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(data)?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                candidate = alternative_filename(filename);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Saves a post image below the media root and returns its media path, i.e. `posts/cat.gif`.
pub async fn save_post_image(media_root: &Path, file: UploadedFile) -> Result<String, UploadError> {
    let dir = media_root.join(POST_IMAGE_DIR);
    let filename = sanitize_filename(&file.filename);

    let stored = web::block(move || store_file(&dir, &filename, &file.data))
        .await
        .map_err(|e| UploadError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
        .map_err(UploadError::Io)?;

    Ok(format!("{}/{}", POST_IMAGE_DIR, stored))
}
