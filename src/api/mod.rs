use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::models::{Chapter, Translation};

mod client;
mod requests;

pub use client::ApiClient;
pub use requests::{
    CreateSeriesRequest, LoginRequest, SeriesStatus, SignupRequest, UnlockType, UploadResponse,
    Visibility,
};

pub type BackendFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// The two backend calls the reader depends on. Futures are `'static` so a
/// session can keep several translate requests in flight while it owns the
/// chapter it merges them into.
pub trait Backend: Clone + Send + Sync + 'static {
    fn fetch_chapter(&self, chapter_id: &str) -> BackendFuture<Chapter>;
    fn translate_layer(&self, layer_id: &str, target_lang: &str) -> BackendFuture<Translation>;
}

/// A failed backend call. `status` is `None` when no HTTP response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "backend error ({}): {}", status, self.message),
            None => write!(f, "backend unreachable: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Pulls the user-facing message out of any error, preferring the backend's
/// own `{"error": ...}` text.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => api.message.clone(),
        None => err.to_string(),
    }
}
