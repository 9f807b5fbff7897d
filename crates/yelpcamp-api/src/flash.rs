use axum::response::{IntoResponse, Redirect, Response};

use yelpcamp_types::api::{Notice, Notices, Severity};

use crate::error::AppError;
use crate::session::SessionContext;
use crate::state::{AppState, blocking};

/// Notices a handler wants shown on the next page render. Carried in the
/// response extensions and persisted by the session layer.
#[derive(Debug, Clone, Default)]
pub struct PendingNotices(pub Vec<Notice>);

pub fn redirect_with(to: &str, notice: Notice) -> Response {
    redirect_with_all(to, vec![notice])
}

pub fn redirect_with_all(to: &str, notices: Vec<Notice>) -> Response {
    let mut response = Redirect::to(to).into_response();
    response.extensions_mut().insert(PendingNotices(notices));
    response
}

/// Drain the session's notice queue for rendering.
pub async fn take_notices(state: &AppState, session: &SessionContext) -> Result<Notices, AppError> {
    let sid = session.id.to_string();
    let rows = blocking(state, move |db| db.take_flashes(&sid)).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            Severity::parse(&row.severity).map(|severity| Notice {
                severity,
                message: row.message,
            })
        })
        .collect())
}

/// Append notices to the session's queue.
pub async fn persist(state: &AppState, session: &SessionContext, notices: Vec<Notice>) -> Result<(), AppError> {
    if notices.is_empty() {
        return Ok(());
    }
    let sid = session.id.to_string();
    blocking(state, move |db| {
        for notice in &notices {
            db.push_flash(&sid, notice.severity.as_str(), &notice.message)?;
        }
        Ok(())
    })
    .await
}
