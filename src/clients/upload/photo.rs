//! Photo uploads.

use std::path::Path;

use crate::clients::api::{ApiClient, UploadPhotoResponse};
use crate::clients::decode::decode_typed;
use crate::clients::errors::{ApiError, InvalidRequestError};
use crate::clients::multipart::{generate_upload_id, MultipartPart};

/// Compression settings reported with every photo.
pub const IMAGE_COMPRESSION: &str = r#"{"lib_name":"jt","lib_version":"1.3.0","quality":"87"}"#;

const PHOTO_ENDPOINT: &str = "upload/photo/";

/// Whether a photo is posted alone or as part of an album.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhotoKind {
    /// A standalone photo.
    #[default]
    Single,
    /// One item of an album.
    Album,
}

impl ApiClient {
    /// Uploads the photo at `path`.
    ///
    /// A fresh upload id is generated when `upload_id` is `None`. The reply
    /// carries the id the photo was stored under.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LoginRequired`] when logged out,
    /// [`ApiError::File`] if the photo cannot be read,
    /// [`ApiError::InvalidRequest`] if it is empty, or any error from the
    /// call itself.
    pub async fn upload_photo(
        &self,
        kind: PhotoKind,
        path: impl AsRef<Path>,
        upload_id: Option<String>,
    ) -> Result<UploadPhotoResponse, ApiError> {
        let path = path.as_ref();
        self.ensure_logged_in(true)?;

        let data = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.to_path_buf(),
            source,
        })?;
        if data.is_empty() {
            return Err(InvalidRequestError::EmptyFile {
                path: path.to_path_buf(),
            }
            .into());
        }

        let parts = photo_parts(
            kind,
            data,
            &upload_id.unwrap_or_else(generate_upload_id),
            self.session().uuid(),
            &self.csrf_token().unwrap_or_default(),
        );

        tracing::debug!(path = %path.display(), ?kind, "Uploading photo");
        let response = self.send_multipart(PHOTO_ENDPOINT, &parts, true).await?;
        decode_typed(&response.body)
    }
}

fn photo_parts(
    kind: PhotoKind,
    data: Vec<u8>,
    upload_id: &str,
    uuid: &str,
    csrf_token: &str,
) -> Vec<MultipartPart> {
    let mut parts = vec![
        MultipartPart::field("upload_id", upload_id),
        MultipartPart::field("_uuid", uuid),
        MultipartPart::field("_csrftoken", csrf_token),
        MultipartPart::field("image_compression", IMAGE_COMPRESSION),
        MultipartPart::file("photo", data, "photo.jpg")
            .header("Content-Transfer-Encoding: binary")
            .header("Content-Type: application/octet-stream"),
    ];
    if kind == PhotoKind::Album {
        parts.push(MultipartPart::field("is_sidecar", "1"));
    }
    parts
}
