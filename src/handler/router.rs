//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, asset/route
//! classification, SPA fallback, and response header policy.

use crate::config::{AppState, ServeConfig};
use crate::handler::static_files;
use crate::handler::status::StatusCapture;
use crate::http::{self, cache};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    /// Final path segment contains a dot: classified as an asset request.
    pub has_extension: bool,
    pub is_head: bool,
    pub access_log: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method();
    let uri = req.uri();
    let path = uri.path();
    let is_head = *method == Method::HEAD;

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);
    if access_log {
        logger::log_request(method, uri, req.version());
    }

    let serve_cfg = &state.config.serve;

    let mut response = match check_http_method(method, serve_cfg.cors) {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext {
                path,
                has_extension: has_dotted_final_segment(path),
                is_head,
                access_log,
            };
            route_request(&ctx, serve_cfg).await
        }
    };

    // Header policy covers every response, including 404s and the fallback
    apply_policy_headers(&mut response, path, serve_cfg.cors);
    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Classify the request by inspecting the final path segment for a dot.
///
/// This is the sole signal distinguishing asset requests from route requests,
/// kept for compatibility with the original behavior. Known limitation: a
/// route whose final segment carries a dot (e.g. `/releases/v1.0`) is
/// classified as an asset and never receives SPA fallback.
fn has_dotted_final_segment(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

/// Dispatch the request: direct serve for assets (or when SPA fallback is
/// off), otherwise probe through the status capture and fall back to the
/// index document on 404.
pub(crate) async fn route_request(
    ctx: &RequestContext<'_>,
    serve_cfg: &ServeConfig,
) -> Response<Full<Bytes>> {
    if ctx.has_extension || !serve_cfg.spa {
        return static_files::serve(ctx, &serve_cfg.root).await;
    }

    let mut capture = StatusCapture::new();
    let probe = static_files::serve(ctx, &serve_cfg.root).await;
    capture.record(probe.status());

    if capture.status() == StatusCode::NOT_FOUND {
        if ctx.access_log {
            logger::log_spa_fallback(ctx.path);
        }
        return static_files::serve_fallback(ctx, &serve_cfg.root).await;
    }

    probe
}

/// Apply the caching and CORS header policy to an outbound response.
///
/// The cache directive is decided purely from the request path, so asset
/// paths get it whether or not the file exists; the CORS header goes on
/// every response when enabled.
fn apply_policy_headers(response: &mut Response<Full<Bytes>>, path: &str, enable_cors: bool) {
    if cache::is_immutable_asset(path) {
        response.headers_mut().insert(
            CACHE_CONTROL,
            HeaderValue::from_static(cache::IMMUTABLE_CACHE_CONTROL),
        );
    }
    if enable_cors {
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn serve_config(root: &str, spa: bool, cors: bool) -> ServeConfig {
        ServeConfig {
            root: root.to_string(),
            spa,
            cors,
        }
    }

    fn route_ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            has_extension: has_dotted_final_segment(path),
            is_head: false,
            access_log: false,
        }
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[test]
    fn classification_inspects_final_segment_only() {
        assert!(has_dotted_final_segment("/missing.js"));
        assert!(has_dotted_final_segment("/releases/v1.0"));
        assert!(has_dotted_final_segment("/index.html"));
        assert!(!has_dotted_final_segment("/dashboard"));
        assert!(!has_dotted_final_segment("/v1.0/users"));
        assert!(!has_dotted_final_segment("/"));
    }

    #[test]
    fn cache_header_applies_to_asset_paths_even_on_404() {
        let mut resp = http::build_404_response();
        apply_policy_headers(&mut resp, "/missing.js", false);
        assert_eq!(
            resp.headers()[CACHE_CONTROL],
            "public, max-age=31536000, immutable"
        );
    }

    #[test]
    fn cache_header_absent_for_route_paths() {
        let mut resp = http::build_404_response();
        apply_policy_headers(&mut resp, "/dashboard", true);
        assert!(resp.headers().get(CACHE_CONTROL).is_none());
    }

    #[test]
    fn cors_header_follows_toggle() {
        let mut resp = http::build_404_response();
        apply_policy_headers(&mut resp, "/dashboard", true);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let mut resp = http::build_404_response();
        apply_policy_headers(&mut resp, "/dashboard", false);
        assert!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn missing_route_falls_back_to_index_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();

        let cfg = serve_config(&dir.path().to_string_lossy(), true, true);
        let resp = route_request(&route_ctx("/dashboard"), &cfg).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await, b"<html>spa</html>");
    }

    #[tokio::test]
    async fn missing_asset_never_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();

        let cfg = serve_config(&dir.path().to_string_lossy(), true, true);
        let resp = route_request(&route_ctx("/missing.js"), &cfg).await;
        assert_eq!(resp.status(), 404);
        assert_eq!(body_bytes(resp).await, b"404 Not Found");
    }

    #[tokio::test]
    async fn extensionless_file_on_disk_wins_over_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();
        std::fs::write(dir.path().join("LICENSE"), "MIT").unwrap();

        let cfg = serve_config(&dir.path().to_string_lossy(), true, true);
        let resp = route_request(&route_ctx("/LICENSE"), &cfg).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await, b"MIT");
    }

    #[tokio::test]
    async fn spa_disabled_serves_plain_404_for_routes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();

        let cfg = serve_config(&dir.path().to_string_lossy(), false, true);
        let resp = route_request(&route_ctx("/dashboard"), &cfg).await;
        assert_eq!(resp.status(), 404);
    }
}
