#![allow(dead_code, unused_macros)]

use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::web::Data;
use sea_orm::{entity::*, DatabaseConnection};
use tempfile::TempDir;
use yatube::config::Settings;
use yatube::orm::{groups, posts, users};
use yatube::session::{MainData, SESSION_COOKIE_NAME};

pub const PASSWORD: &str = "test-password-1";

/// A 1x2 transparent GIF.
pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\
\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

pub struct TestEnv {
    pub data: Data<MainData>,
    pub key: Key,
    /// Removed when the environment is dropped.
    pub media: TempDir,
}

impl TestEnv {
    pub fn db(&self) -> &DatabaseConnection {
        &self.data.db
    }
}

/// Fresh in-memory store and media root.
pub async fn setup() -> TestEnv {
    let media = tempfile::tempdir().expect("tempdir");
    let media_root = media.path().to_string_lossy().into_owned();
    let settings = Settings::from_lookup(move |key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_owned()),
        "MEDIA_ROOT" => Some(media_root.to_owned()),
        _ => None,
    })
    .expect("settings");

    let db = yatube::db::connect(&settings.database_url)
        .await
        .expect("connect");
    yatube::db::create_tables(&db).await.expect("create tables");

    TestEnv {
        data: Data::new(MainData::new(db, settings)),
        key: Key::generate(),
        media,
    }
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> users::Model {
    let hash = yatube::user::hash_password(PASSWORD).expect("hash");
    yatube::user::insert_new_user(db, username, &hash)
        .await
        .expect("insert user")
}

pub async fn create_group(db: &DatabaseConnection, slug: &str) -> groups::Model {
    groups::ActiveModel {
        title: Set(format!("Тестовая группа {}", slug)),
        slug: Set(slug.to_owned()),
        description: Set("Тестовое описание".to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert group")
}

pub async fn create_post(
    db: &DatabaseConnection,
    author: &users::Model,
    text: &str,
    group: Option<&groups::Model>,
) -> posts::Model {
    yatube::post::insert_post(db, author.id, text.to_owned(), group.map(|g| g.id), None)
        .await
        .expect("insert post")
}

/// The session cookie set by a response, i.e. after logging in.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .expect("session cookie")
        .into_owned()
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ascii Location")
        .to_owned()
}

pub async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let body = actix_web::test::read_body(resp).await;
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

/// Number of post cards rendered on a listing page.
pub fn count_cards(body: &str) -> usize {
    body.matches("<article class=\"post\">").count()
}

/// Builds a multipart/form-data body. Files are `(field, filename, content type, bytes)`.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &str, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    for (name, filename, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

/// Builds the app for `$env` and initializes it as a test service.
macro_rules! init_app {
    ($env:expr) => {
        actix_web::test::init_service(yatube::init::app($env.data.clone(), $env.key.clone())).await
    };
}

/// Logs `$username` in through the login form and returns the session cookie.
macro_rules! login {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&[("username", $username), ("password", crate::common::PASSWORD)])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        crate::common::session_cookie(&resp)
    }};
}
