//! Campground and review persistence behind the HTTP handlers.
//!
//! Stores own the collaborator calls (geocoding, image hosting) around the
//! database transactions; authorization has already happened by the time a
//! store method runs.

mod campgrounds;
mod reviews;

pub use campgrounds::{CampgroundStore, UpdateOutcome};
pub use reviews::ReviewStore;

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use bytes::Bytes;
    use uuid::Uuid;

    use yelpcamp_db::Database;
    use yelpcamp_types::models::{Geometry, Image};

    use crate::geocoding::Geocoder;
    use crate::images::{ImageHost, ImageUpload};
    use crate::session::Principal;
    use crate::state::{AppState, AppStateInner};

    /// Resolves every query to the same point, except `"nowhere"`.
    pub struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn forward(&self, query: &str) -> Result<Option<Geometry>> {
            if query == "nowhere" {
                return Ok(None);
            }
            Ok(Some(Geometry::point(-109.5, 38.6)))
        }
    }

    /// Keeps uploads in memory; destroys of names in `failing` error out.
    #[derive(Default)]
    pub struct MemoryImageHost {
        pub stored: Mutex<Vec<String>>,
        pub destroyed: Mutex<Vec<String>>,
        pub failing: HashSet<String>,
    }

    #[async_trait]
    impl ImageHost for MemoryImageHost {
        async fn upload(&self, upload: ImageUpload) -> Result<Image> {
            let filename = format!("YelpCamp/{}", upload.file_name);
            self.stored.lock().unwrap().push(filename.clone());
            Ok(Image {
                url: format!("https://img.test/{}", filename),
                filename,
            })
        }

        async fn destroy(&self, filename: &str) -> Result<()> {
            if self.failing.contains(filename) {
                bail!("host unavailable");
            }
            self.destroyed.lock().unwrap().push(filename.to_string());
            Ok(())
        }
    }

    pub fn state_with(images: Arc<MemoryImageHost>) -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            geocoder: Arc::new(FixedGeocoder),
            images,
            session_secret: "test-secret".into(),
            session_ttl_hours: 1,
            max_images: 10,
        })
    }

    pub fn user(state: &AppState, name: &str) -> Principal {
        let id = Uuid::new_v4();
        state
            .db
            .create_user(&id.to_string(), name, &format!("{}@example.com", name), "hash")
            .unwrap();
        Principal {
            id,
            username: name.into(),
        }
    }

    pub fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.into(),
            content_type: Some("image/png".into()),
            bytes: Bytes::from_static(b"png"),
        }
    }
}
