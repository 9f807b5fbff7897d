use tracing::warn;
use uuid::Uuid;

use yelpcamp_types::models::Campground;

use crate::error::AppError;
use crate::session::Principal;
use crate::state::{AppState, blocking};
use crate::store::ReviewStore;

pub fn campground_path(id: Uuid) -> String {
    format!("/campgrounds/{}", id)
}

pub fn is_owner(principal: &Principal, author: Uuid) -> bool {
    principal.id == author
}

/// The campground, if `principal` authored it.
pub async fn owned_campground(state: &AppState, principal: &Principal, id: Uuid) -> Result<Campground, AppError> {
    let campground = blocking(state, move |db| db.get_campground(id))
        .await?
        .ok_or_else(AppError::campground_not_found)?;

    if !is_owner(principal, campground.author) {
        warn!(
            "User {} tried to modify campground {} owned by {}",
            principal.username, id, campground.author
        );
        return Err(AppError::not_permitted(campground_path(id)));
    }

    Ok(campground)
}

/// Ownership check for a review delete. A review that no longer exists under
/// `campground_id` is let through so the delete stays idempotent; the delete
/// itself is scoped to the same campground.
pub async fn ensure_review_owner(
    state: &AppState,
    principal: &Principal,
    campground_id: Uuid,
    review_id: Uuid,
) -> Result<(), AppError> {
    let review = ReviewStore::new(state).get(campground_id, review_id).await?;
    match review {
        Some(review) if !is_owner(principal, review.author) => {
            warn!(
                "User {} tried to delete review {} owned by {}",
                principal.username, review_id, review.author
            );
            Err(AppError::not_permitted(campground_path(campground_id)))
        }
        _ => Ok(()),
    }
}
