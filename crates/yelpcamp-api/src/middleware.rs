use axum::{
    Extension,
    extract::{Request, State},
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use yelpcamp_types::api::Notice;

use crate::error::AppError;
use crate::flash;
use crate::session::SessionContext;
use crate::state::{AppState, blocking};

/// Login-required gate. Lets the request through with its [`Principal`]
/// in the extensions, or remembers where it was headed and sends it to
/// `/login`.
///
/// [`Principal`]: crate::session::Principal
pub async fn require_auth(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(principal) = session.principal {
        req.extensions_mut().insert(principal);
        return Ok(next.run(req).await);
    }

    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    debug!("Anonymous request to {} redirected to login", path);

    let sid = session.id.to_string();
    blocking(&state, move |db| db.set_return_to(&sid, &path)).await?;

    Ok(flash::redirect_with("/login", Notice::error("You must be logged in")))
}

/// Rewrites `POST ...?_method=PUT|PATCH|DELETE` so plain HTML forms can reach
/// the update and delete routes. Must wrap the router, not sit inside it,
/// because routing has already happened by the time inner layers run.
pub async fn method_override(mut req: Request, next: Next) -> Response {
    if req.method() == Method::POST {
        if let Some(method) = override_method(req.uri()) {
            *req.method_mut() = method;
        }
    }
    next.run(req).await
}

fn override_method(uri: &Uri) -> Option<Method> {
    let (_, value) = uri
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "_method")?;

    match value.to_ascii_uppercase().as_str() {
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}
