use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use tracing::debug;

use crate::error::AppError;
use crate::images::ImageUpload;
use crate::validation::FormFields;

/// Form field that carries uploaded campground images.
pub const IMAGE_FIELD: &str = "image";

/// A submitted HTML form, either urlencoded or multipart. Text parts become
/// [`FormFields`]; non-empty files posted under `image` become uploads.
#[derive(Debug, Default)]
pub struct FormPayload {
    pub fields: FormFields,
    pub uploads: Vec<ImageUpload>,
}

impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !multipart {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(Self {
                fields: FormFields::from_pairs(pairs),
                uploads: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut payload = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            match file_name {
                Some(file_name) if crate::validation::field_name(&name) == IMAGE_FIELD => {
                    // Browsers send an empty part when no file was chosen.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    debug!("Received upload {} ({} bytes)", file_name, bytes.len());
                    payload.uploads.push(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                Some(file_name) => debug!("Ignoring file {} in field {}", file_name, name),
                None => {
                    let value = String::from_utf8(bytes.to_vec())
                        .map_err(|_| AppError::BadRequest(format!("Field {} is not valid UTF-8", name)))?;
                    payload.fields.insert(&name, value);
                }
            }
        }

        Ok(payload)
    }
}
