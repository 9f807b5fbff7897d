use axum::{Extension, Json, extract::State};
use serde::Serialize;

use yelpcamp_types::api::{Page, View, ViewData};

use crate::error::AppError;
use crate::flash;
use crate::session::SessionContext;
use crate::state::AppState;

/// Wrap page data with the current user and the notices queued for this
/// session. Rendering drains the queue.
pub async fn render<T: Serialize>(
    state: &AppState,
    session: &SessionContext,
    data: T,
) -> Result<Json<Page<T>>, AppError> {
    let notices = flash::take_notices(state, session).await?;
    Ok(Json(Page {
        current_user: session.principal.as_ref().map(|p| p.summary()),
        notices,
        data,
    }))
}

pub fn view(view: View) -> ViewData {
    ViewData {
        view,
        campground: None,
    }
}

pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Page<ViewData>>, AppError> {
    render(&state, &session, view(View::Home)).await
}
