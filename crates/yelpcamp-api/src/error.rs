use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use yelpcamp_types::api::{ErrorPage, Notice};

use crate::flash;
use crate::validation::ValidationError;

pub const GENERIC_MESSAGE: &str = "Oops, something went wrong.";

#[derive(Error, Debug)]
pub enum AppError {
    /// Payload failed its schema; never reaches a store.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Body could not be parsed at all (bad multipart, bad form encoding).
    #[error("{0}")]
    BadRequest(String),

    /// A referenced record is missing. Shown as a notice, not an error page.
    #[error("{message}")]
    NotFound { message: String, redirect: String },

    /// Principal may not touch this record. Shown as a notice.
    #[error("{message}")]
    Forbidden { message: String, redirect: String },

    #[error("Page Not Found")]
    PageNotFound,

    #[error("{}", GENERIC_MESSAGE)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn campground_not_found() -> Self {
        Self::NotFound {
            message: "Cannot find that campground".into(),
            redirect: "/campgrounds".into(),
        }
    }

    /// Ownership failure on anything under `/campgrounds/{id}`.
    pub fn not_permitted(campground_path: String) -> Self {
        Self::Forbidden {
            message: "You do not have permission to do that!".into(),
            redirect: campground_path,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => {
                error_page(StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::NotFound { message, redirect } | Self::Forbidden { message, redirect } => {
                flash::redirect_with(&redirect, Notice::error(message))
            }
            Self::PageNotFound => error_page(StatusCode::NOT_FOUND, self.to_string()),
            Self::Internal(e) => {
                error!("Unhandled error: {:#}", e);
                error_page(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.to_string())
            }
        }
    }
}

fn error_page(status: StatusCode, message: String) -> Response {
    let message = if message.is_empty() {
        GENERIC_MESSAGE.to_string()
    } else {
        message
    };
    (
        status,
        Json(ErrorPage {
            status: status.as_u16(),
            message,
        }),
    )
        .into_response()
}

/// Fallback for unmatched routes.
pub async fn page_not_found() -> AppError {
    AppError::PageNotFound
}
