use crate::session::{MainData, SESSION_USER_KEY};
use crate::user::{get_client_user_by_id, ClientUser};
use actix_session::SessionExt;
use actix_utils::future::{ok, Ready};
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use std::rc::Rc;

/// Client context passed to routes.
/// Set once per request by the middleware below; guests carry no user.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx {
    client: Option<ClientUser>,
}

impl ClientCtx {
    pub fn new(client: Option<ClientUser>) -> Self {
        Self { client }
    }

    pub fn user(&self) -> Option<&ClientUser> {
        self.client.as_ref()
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.client {
            Some(user) => user.username.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.client.is_some()
    }

    /// Only authors may change their posts.
    pub fn can_update_post(&self, author_id: i32) -> bool {
        self.get_id() == Some(author_id)
    }

    /// Users may follow anyone but themselves.
    pub fn can_follow(&self, author_id: &i32) -> bool {
        self.is_user() && self.get_id() != Some(*author_id)
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Routes mounted without the middleware (or error pages) see a guest.
        ok(req.extensions().get::<ClientCtx>().cloned().unwrap_or_default())
    }
}

/// Middleware factory resolving the session's user into a `ClientCtx`.
/// Must be wrapped inside the session middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientCtxResolver;

impl<S, B> Transform<S, ServiceRequest> for ClientCtxResolver
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ClientCtxMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ClientCtxMiddleware {
            service: Rc::new(service),
        })
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        async move {
            let user_id = match req.get_session().get::<i32>(SESSION_USER_KEY) {
                Ok(user_id) => user_id,
                Err(e) => {
                    log::error!("ClientCtxMiddleware: session.get(): {}", e);
                    None
                }
            };

            let client = match (user_id, req.app_data::<Data<MainData>>().cloned()) {
                (Some(id), Some(data)) => match get_client_user_by_id(&data.db, id).await {
                    Ok(client) => client,
                    Err(e) => {
                        log::error!("ClientCtxMiddleware: get_client_user_by_id(): {}", e);
                        None
                    }
                },
                _ => None,
            };

            req.extensions_mut().insert(ClientCtx::new(client));
            service.call(req).await
        }
        .boxed_local()
    }
}
