//! Static asset service
//!
//! The request handler never touches the filesystem itself; it hands a
//! rewritten request to an [`AssetFetcher`] and returns whatever comes back.
//! [`DirectoryAssets`] is the implementation the binary runs with.

mod directory;

pub use directory::DirectoryAssets;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::path::PathBuf;
use thiserror::Error;

use crate::http;
use crate::logger;

/// Methods the asset service answers
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Fetch-by-request capability of an asset store
///
/// Implementations report every failure as an HTTP response (404, 405, 500...)
/// so callers can pass the result through untouched.
#[allow(async_fn_in_trait)]
pub trait AssetFetcher<B> {
    async fn fetch(&self, req: Request<B>) -> Response<Full<Bytes>>;
}

/// Reasons an asset request cannot be answered with content
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("method {0} not allowed for assets")]
    MethodNotAllowed(Method),

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("path escapes asset root: {0}")]
    Traversal(String),

    #[error("asset root '{}' unavailable: {source}", .root.display())]
    RootUnavailable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read asset '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    /// Log the failure at the level it deserves and turn it into a response
    pub fn into_response(self) -> Response<Full<Bytes>> {
        match &self {
            Self::MethodNotAllowed(_) | Self::NotFound(_) => {
                logger::log_debug(&self.to_string());
            }
            Self::Traversal(_) => logger::log_warning(&self.to_string()),
            Self::RootUnavailable { .. } | Self::Read { .. } => {
                logger::log_error(&self.to_string());
            }
        }

        match self {
            Self::MethodNotAllowed(_) => http::build_405_response(ALLOWED_METHODS),
            Self::NotFound(_) | Self::Traversal(_) => http::build_404_response(),
            Self::RootUnavailable { .. } | Self::Read { .. } => http::build_500_response(),
        }
    }
}
