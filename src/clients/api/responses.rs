//! Typed response bodies.
//!
//! Every response reports success through a `status` field equal to `"ok"`.
//! Fields a type does not name are kept in its `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clients::decode::option_string_or_number;

/// A response body that reports its own success.
pub trait ApiResponse {
    /// Returns the `status` field.
    fn status(&self) -> Option<&str>;

    /// Returns the `message` field.
    fn message(&self) -> Option<&str>;

    /// Returns `true` if `status` is `"ok"`.
    fn is_ok(&self) -> bool {
        self.status() == Some("ok")
    }
}

macro_rules! impl_api_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ApiResponse for $ty {
                fn status(&self) -> Option<&str> {
                    self.status.as_deref()
                }

                fn message(&self) -> Option<&str> {
                    self.message.as_deref()
                }
            }
        )+
    };
}

/// A response with nothing beyond the status.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `"ok"` or `"fail"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Server message, usually present on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply to `upload/photo/`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadPhotoResponse {
    /// `"ok"` or `"fail"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Server message, usually present on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// The upload id the photo was stored under.
    #[serde(default, deserialize_with = "option_string_or_number")]
    pub upload_id: Option<String>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One chunk-upload target returned by `upload/video/`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoUploadUrl {
    /// Where chunks are posted.
    pub url: String,
    /// The job token sent with every chunk.
    pub job: String,
    /// Expiry, as sent by the server.
    #[serde(default)]
    pub expires: Option<Value>,
}

/// Reply to the video upload negotiation step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadJobVideoResponse {
    /// `"ok"` or `"fail"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Server message, usually present on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// Candidate chunk-upload targets.
    #[serde(default)]
    pub video_upload_urls: Vec<VideoUploadUrl>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply to the final chunk of a video upload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadVideoResponse {
    /// `"ok"` or `"fail"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Server message, usually present on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// The upload id the video was stored under.
    #[serde(default, deserialize_with = "option_string_or_number")]
    pub upload_id: Option<String>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_api_response!(
    StatusResponse,
    UploadPhotoResponse,
    UploadJobVideoResponse,
    UploadVideoResponse,
);
