use std::sync::Arc;

use tracing::error;

use yelpcamp_db::Database;

use crate::error::AppError;
use crate::geocoding::Geocoder;
use crate::images::ImageHost;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub geocoder: Arc<dyn Geocoder>,
    pub images: Arc<dyn ImageHost>,
    pub session_secret: String,
    pub session_ttl_hours: u64,
    /// Upper bound on files accepted by a single campground create/update.
    pub max_images: usize,
}

/// Run a blocking DB call off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(e.into())
        })?
        .map_err(AppError::Internal)
}
