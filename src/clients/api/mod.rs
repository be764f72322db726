//! Account-level API client and typed response bodies.

mod client;
pub mod responses;

pub use client::ApiClient;
pub use responses::{
    ApiResponse, StatusResponse, UploadJobVideoResponse, UploadPhotoResponse,
    UploadVideoResponse, VideoUploadUrl,
};
