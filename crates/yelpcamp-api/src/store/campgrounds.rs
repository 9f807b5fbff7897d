use tracing::{info, warn};
use uuid::Uuid;

use yelpcamp_types::api::CampgroundInput;
use yelpcamp_types::models::{Campground, CampgroundDetail, Image};

use crate::error::AppError;
use crate::images::ImageUpload;
use crate::session::Principal;
use crate::state::{AppState, blocking};

pub struct CampgroundStore {
    state: AppState,
}

/// What an update did beyond the record itself.
#[derive(Debug, Default)]
pub struct UpdateOutcome {
    /// Filenames removed from the record that the image host failed to delete.
    pub failed_deletions: Vec<String>,
}

impl CampgroundStore {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Campground>, AppError> {
        blocking(&self.state, |db| db.list_campgrounds()).await
    }

    pub async fn create(
        &self,
        input: CampgroundInput,
        uploads: Vec<ImageUpload>,
        author: &Principal,
    ) -> Result<Uuid, AppError> {
        let geometry = self.state.geocoder.forward(&input.location).await?;
        if geometry.is_none() {
            info!("No geocoding match for {:?}", input.location);
        }

        let images = self.upload_all(uploads).await?;

        let id = Uuid::new_v4();
        let author_id = author.id;
        blocking(&self.state, move |db| {
            db.insert_campground(id, &input, geometry, &images, author_id)
        })
        .await?;

        info!("User {} created campground {}", author.username, id);
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<CampgroundDetail>, AppError> {
        blocking(&self.state, move |db| db.get_campground_detail(id)).await
    }

    /// Apply scalar changes, append `uploads` and drop `delete_filenames`.
    /// `None` if the campground is gone.
    pub async fn update(
        &self,
        id: Uuid,
        input: CampgroundInput,
        uploads: Vec<ImageUpload>,
        delete_filenames: Vec<String>,
    ) -> Result<Option<UpdateOutcome>, AppError> {
        let images = self.upload_all(uploads).await?;

        let added = images.clone();
        let removed = blocking(&self.state, move |db| {
            db.update_campground(id, &input, &added, &delete_filenames)
        })
        .await?;

        let Some(removed) = removed else {
            warn!("Campground {} vanished during update, discarding {} uploads", id, images.len());
            self.destroy_all(&images).await;
            return Ok(None);
        };

        let failed_deletions = self.destroy_all(&removed).await;
        Ok(Some(UpdateOutcome { failed_deletions }))
    }

    /// Cascade-delete a campground. Returns the number of reviews removed
    /// with it, or `None` if it did not exist.
    pub async fn delete(&self, id: Uuid) -> Result<Option<usize>, AppError> {
        let deleted = blocking(&self.state, move |db| db.delete_campground(id)).await?;
        if let Some(reviews) = deleted {
            info!("Deleted campground {} with {} reviews", id, reviews);
        }
        Ok(deleted)
    }

    async fn upload_all(&self, uploads: Vec<ImageUpload>) -> Result<Vec<Image>, AppError> {
        let mut images = Vec::with_capacity(uploads.len());
        for upload in uploads {
            images.push(self.state.images.upload(upload).await?);
        }
        Ok(images)
    }

    /// Delete each image from the host independently. Returns the filenames
    /// that could not be deleted.
    async fn destroy_all(&self, images: &[Image]) -> Vec<String> {
        let mut failed = Vec::new();
        for image in images {
            if let Err(e) = self.state.images.destroy(&image.filename).await {
                warn!("Failed to delete image {} from host: {:#}", image.filename, e);
                failed.push(image.filename.clone());
            }
        }
        failed
    }
}
