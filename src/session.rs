use crate::cache::PageCache;
use crate::config::Settings;
use actix_session::config::CookieContentSecurity;
use actix_session::{storage::CookieSessionStore, Session, SessionInsertError, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use sea_orm::DatabaseConnection;

/// Session entry holding the authenticated user's id.
pub const SESSION_USER_KEY: &str = "user_id";

pub const SESSION_COOKIE_NAME: &str = "yatube_session";

/// Application state shared by every worker.
pub struct MainData {
    pub db: DatabaseConnection,
    pub cache: PageCache,
    pub settings: Settings,
}

impl MainData {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self {
            db,
            cache: PageCache::new(settings.index_cache_ttl),
            settings,
        }
    }
}

/// Returns the session key from settings, or a fresh one which will not survive a restart.
pub fn session_key(settings: &Settings) -> Key {
    match &settings.secret_key {
        Some(secret) => Key::derive_from(secret),
        None => {
            log::warn!("SECRET_KEY is not set; sessions will not survive a restart.");
            Key::generate()
        }
    }
}

/// Cookie-backed session middleware. Cookie contents are encrypted.
pub fn session_middleware(settings: &Settings, key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(settings.secure_cookies)
        .cookie_same_site(SameSite::Lax)
        .cookie_content_security(CookieContentSecurity::Private)
        .build()
}

/// Binds `user_id` to a fresh session.
pub fn login_session(session: &Session, user_id: i32) -> Result<(), SessionInsertError> {
    session.renew();
    session.insert(SESSION_USER_KEY, user_id)
}

pub fn logout_session(session: &Session) {
    session.purge();
}
