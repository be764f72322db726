//! Upload session identifiers.

/// Identifiers for one negotiated video upload.
///
/// Returned by
/// [`ApiClient::request_video_upload_url`](crate::ApiClient::request_video_upload_url)
/// and consumed by one chunked upload attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSession {
    /// The upload id, sent as `Session-ID` with every chunk.
    pub upload_id: String,
    /// Multipart boundary used during negotiation.
    pub boundary: String,
    /// Job token issued by the server.
    pub job: String,
    /// Absolute URL chunks are posted to.
    pub upload_url: String,
}

impl UploadSession {
    /// Creates a session from known identifiers.
    #[must_use]
    pub fn new(
        upload_id: impl Into<String>,
        boundary: impl Into<String>,
        job: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> Self {
        Self {
            upload_id: upload_id.into(),
            boundary: boundary.into(),
            job: job.into(),
            upload_url: upload_url.into(),
        }
    }
}

/// How a whole-sequence retry obtains its upload session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Every attempt reuses the same session.
    Reuse(UploadSession),
    /// Every attempt negotiates a new upload URL.
    ///
    /// With `upload_id: None` each attempt also gets a fresh upload id.
    Renew {
        /// Upload id to negotiate with, if fixed.
        upload_id: Option<String>,
    },
}
