use std::convert::Infallible;

use axum::{
    Router,
    extract::Request,
    middleware,
    response::Response,
    routing::{delete, get, post, put},
};
use tower::{Layer, Service};

use crate::error::page_not_found;
use crate::middleware::{method_override, require_auth};
use crate::session::load_session;
use crate::state::AppState;
use crate::{auth, campgrounds, pages, reviews};

/// Every route, with sessions loaded for all of them and login required on
/// the mutating and form routes.
pub fn router(state: AppState) -> Router {
    let login_required = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/", get(pages::home))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout).route_layer(login_required.clone()))
        .route(
            "/campgrounds",
            get(campgrounds::index).merge(post(campgrounds::create).route_layer(login_required.clone())),
        )
        .route(
            "/campgrounds/new",
            get(campgrounds::new_form).route_layer(login_required.clone()),
        )
        .route(
            "/campgrounds/{id}",
            get(campgrounds::show).merge(
                put(campgrounds::update)
                    .patch(campgrounds::update)
                    .delete(campgrounds::destroy)
                    .route_layer(login_required.clone()),
            ),
        )
        .route(
            "/campgrounds/{id}/edit",
            get(campgrounds::edit_form).route_layer(login_required.clone()),
        )
        .route(
            "/campgrounds/{id}/reviews",
            post(reviews::create).route_layer(login_required.clone()),
        )
        .route(
            "/campgrounds/{id}/reviews/{review_id}",
            delete(reviews::destroy).route_layer(login_required),
        )
        .fallback(page_not_found)
        .method_not_allowed_fallback(page_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .with_state(state)
}

/// Wrap a finished router so `POST ?_method=...` is rewritten before routing.
pub fn with_method_override(
    router: Router,
) -> impl Service<Request, Response = Response, Error = Infallible, Future: Send> + Clone + Send + 'static {
    middleware::from_fn(method_override).layer(router)
}
