use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Response,
};
use uuid::Uuid;

use yelpcamp_types::api::{CampgroundIndex, CampgroundShow, Notice, Page, View, ViewData};

use crate::authz::{campground_path, owned_campground};
use crate::error::AppError;
use crate::flash;
use crate::forms::FormPayload;
use crate::pages::{render, view};
use crate::session::{Principal, SessionContext};
use crate::state::AppState;
use crate::store::CampgroundStore;
use crate::validation;

/// Path ids that are not UUIDs cannot name a campground.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse().map_err(|_| AppError::campground_not_found())
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Page<CampgroundIndex>>, AppError> {
    let campgrounds = CampgroundStore::new(&state).list().await?;
    render(&state, &session, CampgroundIndex { campgrounds }).await
}

pub async fn new_form(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Page<ViewData>>, AppError> {
    render(&state, &session, view(View::NewCampground)).await
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    form: FormPayload,
) -> Result<Response, AppError> {
    let input = validation::campground_with_uploads(&form.fields, &form.uploads, state.max_images)?;
    let id = CampgroundStore::new(&state)
        .create(input, form.uploads, &principal)
        .await?;

    Ok(flash::redirect_with(
        &campground_path(id),
        Notice::success("Successfully made a new campground!"),
    ))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Page<CampgroundShow>>, AppError> {
    let id = parse_id(&id)?;
    let campground = CampgroundStore::new(&state)
        .get(id)
        .await?
        .ok_or_else(AppError::campground_not_found)?;

    render(&state, &session, CampgroundShow { campground }).await
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Page<ViewData>>, AppError> {
    let campground = owned_campground(&state, &principal, parse_id(&id)?).await?;
    let data = ViewData {
        view: View::EditCampground,
        campground: Some(campground),
    };
    render(&state, &session, data).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    form: FormPayload,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    owned_campground(&state, &principal, id).await?;

    let input = validation::campground_with_uploads(&form.fields, &form.uploads, state.max_images)?;
    let delete_filenames = form.fields.all("deleteImages").to_vec();

    let outcome = CampgroundStore::new(&state)
        .update(id, input, form.uploads, delete_filenames)
        .await?
        .ok_or_else(AppError::campground_not_found)?;

    let mut notices = vec![Notice::success("Successfully updated campground!")];
    if !outcome.failed_deletions.is_empty() {
        notices.push(Notice::error(format!(
            "Could not delete images: {}",
            outcome.failed_deletions.join(", ")
        )));
    }

    Ok(flash::redirect_with_all(&campground_path(id), notices))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    owned_campground(&state, &principal, id).await?;

    CampgroundStore::new(&state)
        .delete(id)
        .await?
        .ok_or_else(AppError::campground_not_found)?;

    Ok(flash::redirect_with(
        "/campgrounds",
        Notice::success("Successfully deleted campground!"),
    ))
}
