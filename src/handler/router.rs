//! Request dispatch module
//!
//! Script clients get `/lib.sh` from the asset service, everyone else is
//! redirected to the project page.

use crate::assets::AssetFetcher;
use crate::config::AppState;
use crate::handler::classify::{classify, user_agent, ClientKind};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderMap, HeaderName, HOST, REFERER};
use hyper::http::uri::{Authority, Scheme};
use hyper::{Request, Response, Uri, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Where every non-script caller is sent
pub const REDIRECT_TARGET: &str = "https://github.com/uswriting/libdotnew";

/// Asset served to script clients, whatever path they asked for
pub const SCRIPT_PATH: &str = "/lib.sh";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let client = classify(req.headers());

    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, peer_addr, client));

    let response = dispatch(req, client, &state.assets).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Classify the caller and produce its response
pub async fn respond<B, F>(req: Request<B>, assets: &F) -> Response<Full<Bytes>>
where
    F: AssetFetcher<B>,
{
    let client = classify(req.headers());
    dispatch(req, client, assets).await
}

async fn dispatch<B, F>(req: Request<B>, client: ClientKind, assets: &F) -> Response<Full<Bytes>>
where
    F: AssetFetcher<B>,
{
    match client {
        ClientKind::Script => {
            let asset_req = script_request(req);
            logger::log_debug(&format!("Script client, fetching {}", asset_req.uri()));
            assets.fetch(asset_req).await
        }
        ClientKind::Other => http::build_redirect_response(REDIRECT_TARGET),
    }
}

/// Retarget a request at `/lib.sh` on the same origin
///
/// Method, headers, version, extensions and body carry over unchanged.
/// The original path and query string are dropped.
pub fn script_request<B>(req: Request<B>) -> Request<B> {
    let (mut parts, body) = req.into_parts();
    parts.uri = script_uri(&parts.uri, &parts.headers);
    Request::from_parts(parts, body)
}

/// `/lib.sh` at the request's origin
///
/// The origin comes from an absolute-form request target, else from `Host`.
/// Without either the result is the bare path, which the asset service
/// resolves the same way.
fn script_uri(uri: &Uri, headers: &HeaderMap) -> Uri {
    let Some(authority) = request_authority(uri, headers) else {
        return Uri::from_static(SCRIPT_PATH);
    };
    let scheme = uri.scheme().cloned().unwrap_or(Scheme::HTTP);

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(SCRIPT_PATH)
        .build()
        .unwrap_or_else(|e| {
            logger::log_warning(&format!("Could not build script URI: {e}"));
            Uri::from_static(SCRIPT_PATH)
        })
}

/// Host and port of the request, without any userinfo
fn request_authority(uri: &Uri, headers: &HeaderMap) -> Option<Authority> {
    let raw = match uri.authority() {
        Some(a) => a.as_str().to_string(),
        None => headers.get(HOST)?.to_str().ok()?.trim().to_string(),
    };
    let host_port = raw.rsplit('@').next().unwrap_or_default();
    host_port.parse().ok()
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr, client: ClientKind) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = user_agent(req.headers());
    entry.client = Some(client.as_str());
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
