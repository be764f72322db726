//! Media uploads.
//!
//! Photos go up in a single multipart call. Videos are negotiated first and
//! then sent in four byte-range chunks, with the whole sequence retried when
//! the server reports it lost chunks.
//!
//! The operations are methods on [`ApiClient`](crate::ApiClient):
//!
//! - [`upload_photo`](crate::ApiClient::upload_photo)
//! - [`request_video_upload_url`](crate::ApiClient::request_video_upload_url)
//! - [`upload_video_chunks`](crate::ApiClient::upload_video_chunks)
//! - [`upload_video`](crate::ApiClient::upload_video)

mod chunks;
mod photo;
mod session;
mod video;

pub use chunks::{
    is_json_object_reply, server_kept_prior_chunks, ChunkPlan, ChunkRange, UploadState,
    CHUNK_COUNT,
};
pub use photo::{PhotoKind, IMAGE_COMPRESSION};
pub use session::{SessionPolicy, UploadSession};
