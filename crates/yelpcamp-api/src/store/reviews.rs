use tracing::info;
use uuid::Uuid;

use yelpcamp_types::api::ReviewInput;
use yelpcamp_types::models::Review;

use crate::error::AppError;
use crate::session::Principal;
use crate::state::{AppState, blocking};

pub struct ReviewStore {
    state: AppState,
}

impl ReviewStore {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Add a review to a campground. `None` if the campground does not exist,
    /// in which case nothing is written.
    pub async fn create(
        &self,
        campground_id: Uuid,
        input: ReviewInput,
        author: &Principal,
    ) -> Result<Option<Review>, AppError> {
        let review_id = Uuid::new_v4();
        let author_id = author.id;
        let review = blocking(&self.state, move |db| {
            db.insert_review(campground_id, review_id, &input, author_id)
        })
        .await?;

        if review.is_some() {
            info!("User {} reviewed campground {}", author.username, campground_id);
        }
        Ok(review)
    }

    /// Unlink and delete. Succeeds whether or not the review exists under
    /// `campground_id`.
    pub async fn delete(&self, campground_id: Uuid, review_id: Uuid) -> Result<(), AppError> {
        blocking(&self.state, move |db| db.delete_review(campground_id, review_id)).await
    }

    /// The review, if it belongs to `campground_id`.
    pub async fn get(&self, campground_id: Uuid, review_id: Uuid) -> Result<Option<Review>, AppError> {
        blocking(&self.state, move |db| db.get_campground_review(campground_id, review_id)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use yelpcamp_types::api::CampgroundInput;

    use crate::store::CampgroundStore;
    use crate::store::testing::{MemoryImageHost, state_with, user};

    fn input() -> ReviewInput {
        ReviewInput {
            body: "Great stars".into(),
            rating: 5,
        }
    }

    #[tokio::test]
    async fn review_on_missing_campground_is_not_written() {
        let state = state_with(Arc::new(MemoryImageHost::default()));
        let critic = user(&state, "critic");
        let store = ReviewStore::new(&state);

        assert!(store.create(Uuid::new_v4(), input(), &critic).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_unknown_review_succeeds() {
        let state = state_with(Arc::new(MemoryImageHost::default()));
        let store = ReviewStore::new(&state);

        store.delete(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn review_is_only_reachable_through_its_campground() {
        let state = state_with(Arc::new(MemoryImageHost::default()));
        let critic = user(&state, "critic");
        let campgrounds = CampgroundStore::new(&state);
        let store = ReviewStore::new(&state);

        let blank = CampgroundInput {
            title: "Camp".into(),
            price: 5.0,
            location: "Moab, Utah".into(),
            description: "Red rock".into(),
        };
        let home = campgrounds.create(blank.clone(), vec![], &critic).await.unwrap();
        let elsewhere = campgrounds.create(blank, vec![], &critic).await.unwrap();
        let review = store.create(home, input(), &critic).await.unwrap().unwrap();

        assert!(store.get(elsewhere, review.id).await.unwrap().is_none());
        store.delete(elsewhere, review.id).await.unwrap();
        assert_eq!(store.get(home, review.id).await.unwrap().unwrap().author, critic.id);
    }
}
