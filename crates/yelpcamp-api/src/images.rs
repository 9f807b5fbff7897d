use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use yelpcamp_types::models::Image;

use crate::validation::image_extension;

/// One uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn extension(&self) -> Option<String> {
        image_extension(&self.file_name)
    }
}

/// Where campground images live. `filename` on the returned [`Image`] is the
/// key later passed to [`ImageHost::destroy`].
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, upload: ImageUpload) -> Result<Image>;

    async fn destroy(&self, filename: &str) -> Result<()>;
}

// ── Local disk ──────────────────────────────────────────────────────────

/// Stores images as flat files in one directory, served back under
/// `public_prefix`.
pub struct DiskImageHost {
    dir: PathBuf,
    public_prefix: String,
}

impl DiskImageHost {
    pub async fn new(dir: PathBuf, public_prefix: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_prefix: public_prefix.into(),
        })
    }

    /// Path for a stored image. Rejects anything that is not a bare file name.
    fn file_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.starts_with('.')
        {
            bail!("Invalid image filename: {:?}", filename);
        }
        Ok(self.dir.join(filename))
    }
}

#[async_trait]
impl ImageHost for DiskImageHost {
    async fn upload(&self, upload: ImageUpload) -> Result<Image> {
        let ext = upload
            .extension()
            .ok_or_else(|| anyhow!("Unsupported image type: {}", upload.file_name))?;
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.file_path(&filename)?;

        fs::write(&path, &upload.bytes).await?;
        info!("Stored image {} ({} bytes)", filename, upload.bytes.len());

        Ok(Image {
            url: format!("{}/{}", self.public_prefix.trim_end_matches('/'), filename),
            filename,
        })
    }

    async fn destroy(&self, filename: &str) -> Result<()> {
        let path = self.file_path(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted image {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Image {} already gone", filename);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ── Cloudinary ──────────────────────────────────────────────────────────

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

pub struct CloudinaryHost {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryHost {
    pub fn new(cloud_name: String, api_key: String, api_secret: String, folder: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
            folder,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", CLOUDINARY_API, self.cloud_name, action)
    }
}

/// Cloudinary request signature: SHA-1 over the sorted `key=value` pairs
/// joined by `&`, with the API secret appended.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, upload: ImageUpload) -> Result<Image> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let mut part = reqwest::multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone());
        if let Some(ct) = &upload.content_type {
            part = part.mime_str(ct)?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature);

        let resp: UploadResponse = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Uploaded {} to Cloudinary as {}", upload.file_name, resp.public_id);
        Ok(Image {
            url: resp.secure_url,
            filename: resp.public_id,
        })
    }

    async fn destroy(&self, filename: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", filename), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let resp: DestroyResponse = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", filename),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match resp.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                warn!("Cloudinary image {} already gone", filename);
                Ok(())
            }
            other => bail!("Cloudinary refused to destroy {}: {}", filename, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: Some("image/jpeg".into()),
            bytes: Bytes::from_static(b"\xff\xd8\xff"),
        }
    }

    #[test]
    fn signature_ignores_parameter_order() {
        let a = sign(&[("timestamp", "1315060510"), ("public_id", "sample")], "abcd");
        let b = sign(&[("public_id", "sample"), ("timestamp", "1315060510")], "abcd");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert_ne!(a, sign(&[("public_id", "sample"), ("timestamp", "1315060510")], "other"));
    }

    #[tokio::test]
    async fn disk_host_stores_and_destroys() {
        let dir = std::env::temp_dir().join(format!("yelpcamp_images_{}", Uuid::new_v4()));
        let host = DiskImageHost::new(dir.clone(), "/uploads").await.unwrap();

        let image = host.upload(upload("Tent.JPG")).await.unwrap();
        assert!(image.filename.ends_with(".jpg"));
        assert_eq!(image.url, format!("/uploads/{}", image.filename));
        assert!(dir.join(&image.filename).exists());

        host.destroy(&image.filename).await.unwrap();
        assert!(!dir.join(&image.filename).exists());

        // Already gone is not an error.
        host.destroy(&image.filename).await.unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn disk_host_rejects_path_traversal() {
        let dir = std::env::temp_dir().join(format!("yelpcamp_images_{}", Uuid::new_v4()));
        let host = DiskImageHost::new(dir.clone(), "/uploads").await.unwrap();

        assert!(host.destroy("../etc/passwd").await.is_err());
        assert!(host.destroy("..").await.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
