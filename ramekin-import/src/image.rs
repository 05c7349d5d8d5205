//! Relaying recipe images from the source platform into ramekin's photo store.
//!
//! Image failures never fail the recipe: the relay logs and returns `None`.

use async_trait::async_trait;
use std::future::Future;
use uuid::Uuid;

use crate::error::{ImageError, UploadError};
use crate::session::Session;

/// Maximum image size relayed by default (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Destination for imported images. Returns the stored photo's ID.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload_image(&self, data: Vec<u8>) -> Result<Uuid, UploadError>;
}

/// Adapts an async function into an [`ImageUploader`].
pub struct UploadFn<F>(pub F);

#[async_trait]
impl<F, Fut> ImageUploader for UploadFn<F>
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Uuid, UploadError>> + Send,
{
    async fn upload_image(&self, data: Vec<u8>) -> Result<Uuid, UploadError> {
        (self.0)(data).await
    }
}

/// Where a recipe's image lives and whether the run's credentials are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub url: String,
    pub authenticated: bool,
}

impl ImageSource {
    pub fn authenticated(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authenticated: true,
        }
    }

    pub fn public(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authenticated: false,
        }
    }
}

/// Fetch the image and hand its bytes to the uploader.
pub async fn fetch_and_upload(
    session: &Session,
    uploader: &dyn ImageUploader,
    source: Option<&ImageSource>,
    max_bytes: usize,
) -> Result<Uuid, ImageError> {
    let source = source.ok_or(ImageError::NoImage)?;
    let data = session
        .get_bytes(&source.url, source.authenticated, max_bytes)
        .await?;
    if data.is_empty() {
        return Err(ImageError::NoImage);
    }
    Ok(uploader.upload_image(data).await?)
}

/// Best-effort variant of [`fetch_and_upload`]: any failure is logged and yields `None`.
pub async fn relay_image(
    session: &Session,
    uploader: &dyn ImageUploader,
    source: Option<&ImageSource>,
    max_bytes: usize,
) -> Option<Uuid> {
    match fetch_and_upload(session, uploader, source, max_bytes).await {
        Ok(id) => Some(id),
        Err(ImageError::NoImage) => None,
        Err(e) => {
            let url = source.map(|s| s.url.as_str()).unwrap_or_default();
            tracing::warn!(url, username = session.username(), error = %e, "image not imported");
            None
        }
    }
}
