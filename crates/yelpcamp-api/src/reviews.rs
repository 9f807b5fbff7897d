use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use yelpcamp_types::api::{Notice, ReviewInput};

use crate::authz::{campground_path, ensure_review_owner};
use crate::campgrounds::parse_id;
use crate::error::AppError;
use crate::flash;
use crate::forms::FormPayload;
use crate::session::Principal;
use crate::state::AppState;
use crate::store::ReviewStore;
use crate::validation;

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    form: FormPayload,
) -> Result<Response, AppError> {
    let campground_id = parse_id(&id)?;
    let input = validation::validate::<ReviewInput>(&form.fields)?;

    ReviewStore::new(&state)
        .create(campground_id, input, &principal)
        .await?
        .ok_or_else(AppError::campground_not_found)?;

    Ok(flash::redirect_with(
        &campground_path(campground_id),
        Notice::success("Created new review!"),
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let campground_id = parse_id(&id)?;
    let path = campground_path(campground_id);

    // An id that cannot exist deletes nothing.
    let Ok(review_id) = review_id.parse::<Uuid>() else {
        debug!("Ignoring delete of malformed review id {:?}", review_id);
        return Ok(flash::redirect_with(&path, Notice::success("Successfully deleted review!")));
    };

    ensure_review_owner(&state, &principal, campground_id, review_id).await?;
    ReviewStore::new(&state).delete(campground_id, review_id).await?;

    Ok(flash::redirect_with(&path, Notice::success("Successfully deleted review!")))
}
