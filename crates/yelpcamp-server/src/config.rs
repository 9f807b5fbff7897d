use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

/// Session secrets that must never reach a release build.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];
const DEV_SECRET: &str = "dev-secret-change-me";

pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_ttl_hours: u64,
    pub upload_dir: PathBuf,
    pub max_images: usize,
    pub mapbox_token: Option<String>,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let session_secret = lookup("YELPCAMP_SESSION_SECRET").unwrap_or_default();
        let session_secret = if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            if !cfg!(debug_assertions) {
                bail!("YELPCAMP_SESSION_SECRET is unset or still a placeholder");
            }
            warn!("YELPCAMP_SESSION_SECRET is unset, using the development secret");
            DEV_SECRET.to_string()
        } else {
            session_secret
        };

        let cloudinary = match (
            lookup("CLOUDINARY_CLOUD_NAME"),
            lookup("CLOUDINARY_KEY"),
            lookup("CLOUDINARY_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            (None, None, None) => None,
            _ => bail!("CLOUDINARY_CLOUD_NAME, CLOUDINARY_KEY and CLOUDINARY_SECRET must be set together"),
        };

        Ok(Self {
            host: try_load(&lookup, "YELPCAMP_HOST", "0.0.0.0")?,
            port: try_load(&lookup, "YELPCAMP_PORT", "3000")?,
            db_path: db_path(&lookup),
            session_secret,
            session_ttl_hours: try_load(&lookup, "YELPCAMP_SESSION_TTL_HOURS", "168")?,
            upload_dir: try_load(&lookup, "YELPCAMP_UPLOAD_DIR", "./uploads")?,
            max_images: try_load(&lookup, "YELPCAMP_MAX_IMAGES", "10")?,
            mapbox_token: lookup("MAPBOX_TOKEN").filter(|t| !t.is_empty()),
            cloudinary,
        })
    }
}

pub fn db_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("YELPCAMP_DB_PATH")
        .unwrap_or_else(|| "yelpcamp.db".into())
        .into()
}

fn try_load<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[("YELPCAMP_SESSION_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("yelpcamp.db"));
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.max_images, 10);
        assert!(config.mapbox_token.is_none());
        assert!(config.cloudinary.is_none());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = config(&[("YELPCAMP_SESSION_SECRET", "s3cret"), ("YELPCAMP_PORT", "http")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("YELPCAMP_PORT"));
    }

    #[test]
    fn partial_cloudinary_credentials_are_rejected() {
        assert!(config(&[("YELPCAMP_SESSION_SECRET", "s3cret"), ("CLOUDINARY_KEY", "k")]).is_err());

        let config = config(&[
            ("YELPCAMP_SESSION_SECRET", "s3cret"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_KEY", "k"),
            ("CLOUDINARY_SECRET", "s"),
        ])
        .unwrap();
        assert_eq!(config.cloudinary.unwrap().cloud_name, "demo");
    }

    #[test]
    fn placeholder_secret_falls_back_in_debug_builds() {
        let result = config(&[("YELPCAMP_SESSION_SECRET", "change-me-to-a-random-string")]);
        if cfg!(debug_assertions) {
            assert_eq!(result.unwrap().session_secret, DEV_SECRET);
        } else {
            assert!(result.is_err());
        }
    }
}
