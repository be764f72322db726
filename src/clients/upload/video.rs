//! Chunked video uploads.
//!
//! A video upload is negotiated with [`ApiClient::request_video_upload_url`],
//! then sent in four sequential chunks by
//! [`ApiClient::upload_video_chunks`]. An overloaded server sometimes drops
//! chunks it already acknowledged. That surfaces as
//! [`ApiError::ServerDroppedChunks`], and [`ApiClient::upload_video`] answers
//! it by repeating the whole sequence.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::clients::api::{ApiClient, UploadJobVideoResponse, UploadVideoResponse};
use crate::clients::decode::decode_typed;
use crate::clients::errors::{ApiError, InvalidRequestError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::clients::multipart::{generate_upload_id, MultipartPart};
use crate::clients::upload::chunks::{
    is_json_object_reply, server_kept_prior_chunks, ChunkPlan, ChunkRange, UploadState,
};
use crate::clients::upload::session::{SessionPolicy, UploadSession};

const VIDEO_ENDPOINT: &str = "upload/video/";

/// Index of the upload target used from a negotiation reply.
const UPLOAD_URL_INDEX: usize = 3;

const FALLBACK_VIDEO_EXTENSION: &str = "mp4";

impl ApiClient {
    /// Negotiates a video upload.
    ///
    /// A fresh upload id is generated when `upload_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LoginRequired`] when logged out,
    /// [`ApiError::MalformedResponse`] if the reply lists no upload targets,
    /// or any error from the call itself.
    pub async fn request_video_upload_url(
        &self,
        upload_id: Option<String>,
    ) -> Result<UploadSession, ApiError> {
        let upload_id = upload_id.unwrap_or_else(generate_upload_id);
        let boundary = self.session().uuid().to_string();

        let parts = [
            MultipartPart::field("upload_id", upload_id.as_str()),
            MultipartPart::field("_csrftoken", self.csrf_token().unwrap_or_default()),
            MultipartPart::field("media_type", "2"),
            MultipartPart::field("_uuid", boundary.as_str()),
        ];

        let response = self.send_multipart(VIDEO_ENDPOINT, &parts, true).await?;
        let reply: UploadJobVideoResponse = decode_typed(&response.body)?;

        let target = reply
            .video_upload_urls
            .get(UPLOAD_URL_INDEX)
            .or_else(|| reply.video_upload_urls.last())
            .ok_or_else(|| ApiError::malformed("reply lists no video upload urls", &response.body))?;

        Ok(UploadSession::new(
            upload_id,
            boundary,
            target.job.clone(),
            target.url.clone(),
        ))
    }

    /// Sends the video at `path` in one chunked attempt.
    ///
    /// Chunks are sent strictly in order. If an intermediate acknowledgment
    /// shows the server lost earlier chunks, the remaining chunks are
    /// skipped and that acknowledgment is treated as the final reply.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ServerDroppedChunks`] if the final reply is not a
    /// JSON object, [`ApiError::File`] on read errors,
    /// [`ApiError::InvalidRequest`] for an empty file,
    /// [`ApiError::ApiCallFailed`] if the final reply reports failure, or any
    /// transport error.
    pub async fn upload_video_chunks(
        &self,
        path: impl AsRef<Path>,
        session: &UploadSession,
    ) -> Result<UploadVideoResponse, ApiError> {
        let path = path.as_ref();
        self.ensure_logged_in(true)?;

        let file_error = |source: std::io::Error| ApiError::File {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).await.map_err(file_error)?;
        let total = file.metadata().await.map_err(file_error)?.len();
        let plan = ChunkPlan::new(total);
        if plan.is_empty() {
            return Err(InvalidRequestError::EmptyFile {
                path: path.to_path_buf(),
            }
            .into());
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(FALLBACK_VIDEO_EXTENSION);

        log_state(session, UploadState::Init);
        let mut last_reply: Option<HttpResponse> = None;

        for range in plan.ranges() {
            let mut data = Vec::new();
            (&mut file)
                .take(range.len())
                .read_to_end(&mut data)
                .await
                .map_err(file_error)?;
            if data.len() as u64 != range.len() {
                return Err(file_error(std::io::Error::from(
                    std::io::ErrorKind::UnexpectedEof,
                )));
            }

            log_state(session, UploadState::SendingChunk(range.index));
            let request = chunk_request(self, session, range, total, extension, data)?;
            let reply = self.http().send(&request).await?;
            log_state(session, UploadState::ChunkAcked(range.index));

            let intact = plan.is_last(range) || server_kept_prior_chunks(&reply.body);
            last_reply = Some(reply);
            if !intact {
                log_state(session, UploadState::Aborted);
                break;
            }
        }
        drop(file);

        let Some(reply) = last_reply else {
            return Err(ApiError::malformed("no chunk reply", b""));
        };

        if !is_json_object_reply(&reply.body) {
            return Err(ApiError::ServerDroppedChunks {
                path: path.to_path_buf(),
                reply: String::from_utf8_lossy(&reply.body).into_owned(),
            });
        }

        log_state(session, UploadState::Completed);
        decode_typed(&reply.body)
    }

    /// Uploads the video at `path`, repeating the whole chunk sequence when
    /// the server drops chunks.
    ///
    /// Up to `max_attempts` attempts are made, defaulting to the configured
    /// [`upload_attempts`](crate::ClientConfig::upload_attempts). Only
    /// [`ApiError::ServerDroppedChunks`] triggers another attempt.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once attempts run out, or any other
    /// error immediately.
    pub async fn upload_video(
        &self,
        path: impl AsRef<Path>,
        policy: SessionPolicy,
        max_attempts: Option<u32>,
    ) -> Result<UploadVideoResponse, ApiError> {
        let path = path.as_ref();
        let max_attempts = max_attempts
            .unwrap_or_else(|| self.config().upload_attempts())
            .max(1);

        let mut attempt = 1;
        loop {
            let session = match &policy {
                SessionPolicy::Reuse(session) => session.clone(),
                SessionPolicy::Renew { upload_id } => {
                    self.request_video_upload_url(upload_id.clone()).await?
                }
            };

            match self.upload_video_chunks(path, &session).await {
                Err(error) if error.is_dropped_chunks() && attempt < max_attempts => {
                    tracing::warn!(
                        path = %path.display(),
                        upload_id = %session.upload_id,
                        "Server dropped chunks, retrying upload {attempt}/{max_attempts}"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn chunk_request(
    client: &ApiClient,
    session: &UploadSession,
    range: &ChunkRange,
    total: u64,
    extension: &str,
    data: Vec<u8>,
) -> Result<HttpRequest, InvalidRequestError> {
    let headers = client.config().headers();
    HttpRequest::builder(HttpMethod::Post, session.upload_url.as_str())
        .header("User-Agent", client.session().user_agent())
        .header("Connection", "keep-alive")
        .header("Accept", "*/*")
        .header("Cookie2", "$Version=1")
        .header("Accept-Encoding", headers.accept_encoding.as_str())
        .header("Accept-Language", headers.accept_language.as_str())
        .header("Content-Type", "application/octet-stream")
        .header("Session-ID", session.upload_id.as_str())
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"video.{extension}\""),
        )
        .header("Content-Range", range.content_range(total))
        .header("job", session.job.as_str())
        .body(data)
        .debug_uploaded_bytes(true)
        .build()
}

fn log_state(session: &UploadSession, state: UploadState) {
    tracing::debug!(upload_id = %session.upload_id, %state, "Video upload state");
}
