use super::{db_error, redirect, LOGIN_URL};
use crate::form::{clean_signup, safe_next, FormErrors, LoginFormData, SignupFormData};
use crate::middleware::ClientCtx;
use crate::session::{login_session, logout_session, MainData};
use crate::user::{get_user_by_name, hash_password, insert_new_user, verify_password};
use actix_session::Session;
use actix_web::{error, get, post, route, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_logout)
        .service(view_signup)
        .service(post_signup);
}

const BAD_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub next: &'a str,
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub client: ClientCtx,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub errors: FormErrors,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[get("/auth/login/")]
async fn view_login(client: ClientCtx, query: web::Query<NextQuery>) -> impl Responder {
    LoginTemplate {
        client,
        username: "",
        next: query.next.as_deref().unwrap_or_default(),
        error: None,
    }
    .to_response()
}

#[post("/auth/login/")]
async fn post_login(
    client: ClientCtx,
    data: web::Data<MainData>,
    session: Session,
    form: web::Form<LoginFormData>,
) -> Result<HttpResponse, Error> {
    let user = get_user_by_name(&data.db, form.username.trim())
        .await
        .map_err(db_error)?;

    let verified = match &user {
        Some(user) => {
            let password = form.password.to_owned();
            let hash = user.password.to_owned();
            web::block(move || verify_password(&password, &hash))
                .await
                .map_err(error::ErrorInternalServerError)?
        }
        None => false,
    };

    match user {
        Some(user) if verified => {
            login_session(&session, user.id).map_err(error::ErrorInternalServerError)?;
            log::info!("{} logged in", user.username);
            Ok(redirect(safe_next(form.next.as_deref())))
        }
        _ => {
            log::debug!("post_login: failed login for '{}'", form.username);
            Ok(LoginTemplate {
                client,
                username: &form.username,
                next: form.next.as_deref().unwrap_or_default(),
                error: Some(BAD_LOGIN),
            }
            .to_response())
        }
    }
}

#[route("/auth/logout/", method = "GET", method = "POST")]
async fn view_logout(client: ClientCtx, session: Session) -> impl Responder {
    if client.is_user() {
        log::info!("{} logged out", client.get_name());
    }
    logout_session(&session);

    LoggedOutTemplate {
        client: ClientCtx::default(),
    }
    .to_response()
}

#[get("/auth/signup/")]
async fn view_signup(client: ClientCtx) -> impl Responder {
    SignupTemplate {
        client,
        username: "",
        errors: FormErrors::default(),
    }
    .to_response()
}

fn rejected_signup(client: ClientCtx, username: &str, errors: FormErrors) -> HttpResponse {
    SignupTemplate {
        client,
        username,
        errors,
    }
    .to_response()
}

#[post("/auth/signup/")]
async fn post_signup(
    client: ClientCtx,
    data: web::Data<MainData>,
    form: web::Form<SignupFormData>,
) -> Result<HttpResponse, Error> {
    let clean = match clean_signup(&form) {
        Ok(clean) => clean,
        Err(errors) => return Ok(rejected_signup(client, &form.username, errors)),
    };

    if get_user_by_name(&data.db, &clean.username)
        .await
        .map_err(db_error)?
        .is_some()
    {
        let mut errors = FormErrors::default();
        errors.add("username", "A user with that username already exists.");
        return Ok(rejected_signup(client, &form.username, errors));
    }

    let password = clean.password;
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(error::ErrorInternalServerError)?
        .map_err(|e| {
            log::error!("post_signup: hash_password(): {}", e);
            error::ErrorInternalServerError("Failed to hash password.")
        })?;

    let user = insert_new_user(&data.db, &clean.username, &password_hash)
        .await
        .map_err(db_error)?;
    log::info!("New user {} signed up", user.username);

    Ok(redirect(LOGIN_URL))
}
