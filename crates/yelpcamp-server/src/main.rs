use std::net::SocketAddr;
use std::sync::Arc;

use axum::{ServiceExt, extract::{DefaultBodyLimit, Request}};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use yelpcamp_api::geocoding::{Geocoder, MapboxGeocoder, NoGeocoder};
use yelpcamp_api::images::{CloudinaryHost, DiskImageHost, ImageHost};
use yelpcamp_api::{AppStateInner, router, with_method_override};
use yelpcamp_db::Database;
use yelpcamp_server::cleanup;
use yelpcamp_server::config::Config;

const CLOUDINARY_FOLDER: &str = "YelpCamp";
const UPLOADS_PATH: &str = "/uploads";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yelpcamp=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;

    let geocoder: Arc<dyn Geocoder> = match &config.mapbox_token {
        Some(token) => {
            info!("Geocoding with Mapbox");
            Arc::new(MapboxGeocoder::new(token.clone()))
        }
        None => {
            warn!("MAPBOX_TOKEN not set, campgrounds will have no map location");
            Arc::new(NoGeocoder)
        }
    };

    let images: Arc<dyn ImageHost> = match &config.cloudinary {
        Some(c) => {
            info!("Hosting images on Cloudinary ({})", c.cloud_name);
            Arc::new(CloudinaryHost::new(
                c.cloud_name.clone(),
                c.api_key.clone(),
                c.api_secret.clone(),
                CLOUDINARY_FOLDER.to_string(),
            ))
        }
        None => Arc::new(DiskImageHost::new(config.upload_dir.clone(), UPLOADS_PATH).await?),
    };

    let state = Arc::new(AppStateInner {
        db,
        geocoder,
        images,
        session_secret: config.session_secret.clone(),
        session_ttl_hours: config.session_ttl_hours,
        max_images: config.max_images,
    });

    // Background session cleanup (runs every hour)
    tokio::spawn(cleanup::run_cleanup_loop(state.clone(), 3600));

    let mut app = router(state);
    if config.cloudinary.is_none() {
        app = app.nest_service(UPLOADS_PATH, ServeDir::new(&config.upload_dir));
    }

    let app = app
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());
    let app = with_method_override(app);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("YelpCamp listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
