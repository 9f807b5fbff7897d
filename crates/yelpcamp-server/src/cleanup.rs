use std::time::Duration;

use tracing::{info, warn};

use yelpcamp_api::AppState;

/// Background task that prunes expired sessions (and, through the foreign
/// key, their queued notices).
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let st = state.clone();
        match tokio::task::spawn_blocking(move || st.db.delete_expired_sessions()).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired sessions", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {}", e),
            Err(e) => warn!("Cleanup task failed: {}", e),
        }
    }
}
