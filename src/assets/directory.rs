//! Directory-backed asset store
//!
//! Serves files below a root directory by request path, with `ETag`
//! revalidation and `HEAD` support.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::{AssetError, AssetFetcher};
use crate::http::{self, cache, mime};

/// Asset store rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
    cache_max_age: u32,
}

impl DirectoryAssets {
    pub const fn new(root: PathBuf, cache_max_age: u32) -> Self {
        Self {
            root,
            cache_max_age,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn serve(
        &self,
        method: &Method,
        path: &str,
        if_none_match: Option<&str>,
    ) -> Result<Response<Full<Bytes>>, AssetError> {
        let is_head = *method == Method::HEAD;
        if !is_head && *method != Method::GET {
            return Err(AssetError::MethodNotAllowed(method.clone()));
        }

        let file_path = self.resolve(path).await?;
        let content = fs::read(&file_path)
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => AssetError::NotFound(path.to_string()),
                _ => AssetError::Read {
                    path: file_path.clone(),
                    source,
                },
            })?;

        let etag = cache::generate_etag(&content);
        if cache::is_not_modified(if_none_match, &etag) {
            return Ok(http::build_304_response(&etag, self.cache_max_age));
        }

        let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
        Ok(http::build_asset_response(
            Bytes::from(content),
            content_type,
            &etag,
            self.cache_max_age,
            is_head,
        ))
    }

    /// Map a request path onto a regular file inside the root
    async fn resolve(&self, path: &str) -> Result<PathBuf, AssetError> {
        let mut relative = PathBuf::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(AssetError::Traversal(path.to_string())),
                s => relative.push(s),
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(AssetError::NotFound(path.to_string()));
        }
        // Only plain names, so a drive prefix or backslash root cannot sneak in
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(AssetError::Traversal(path.to_string()));
        }

        let root = fs::canonicalize(&self.root)
            .await
            .map_err(|source| AssetError::RootUnavailable {
                root: self.root.clone(),
                source,
            })?;

        let candidate = match fs::canonicalize(root.join(&relative)).await {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AssetError::NotFound(path.to_string()));
            }
            Err(source) => {
                return Err(AssetError::Read {
                    path: root.join(&relative),
                    source,
                });
            }
        };

        // Symlinks may point outside the root even without `..` in the path
        if !candidate.starts_with(&root) {
            return Err(AssetError::Traversal(path.to_string()));
        }

        let is_file = fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(AssetError::NotFound(path.to_string()));
        }

        Ok(candidate)
    }
}

impl<B> AssetFetcher<B> for DirectoryAssets {
    async fn fetch(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let if_none_match = req
            .headers()
            .get("if-none-match")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        drop(req);

        self.serve(&method, &path, if_none_match.as_deref())
            .await
            .unwrap_or_else(AssetError::into_response)
    }
}
