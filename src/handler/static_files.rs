//! Static file serving module
//!
//! Maps request paths onto files beneath the served root, streams their
//! contents with a MIME type derived from the extension, and transfers the
//! index document for SPA fallback.

use crate::handler::router::RequestContext;
use crate::http::{self, mime, response};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Fallback document served for routes that miss on disk.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Serve the file at the request path beneath `root`, or 404.
pub async fn serve(ctx: &RequestContext<'_>, root: &str) -> Response<Full<Bytes>> {
    match load(root, ctx.path).await {
        Some((content, content_type)) => {
            if ctx.access_log {
                logger::log_response(200, content.len());
            }
            response::build_file_response(content, content_type, ctx.is_head)
        }
        None => http::build_404_response(),
    }
}

/// Transfer the index document for a fallen-back route.
///
/// A missing index document surfaces as a plain 404 to the client; there is
/// no further fallback chain.
pub async fn serve_fallback(ctx: &RequestContext<'_>, root: &str) -> Response<Full<Bytes>> {
    let index_path = Path::new(root).join(INDEX_DOCUMENT);
    match fs::read(&index_path).await {
        Ok(content) => {
            if ctx.access_log {
                logger::log_response(200, content.len());
            }
            response::build_file_response(
                content,
                mime::get_content_type(Some("html")),
                ctx.is_head,
            )
        }
        Err(_) => http::build_404_response(),
    }
}

/// Resolve a request path beneath the root and read it.
///
/// Directory requests resolve through the index document. Resolution is
/// canonicalized and checked against the root so traversal attempts cannot
/// escape the served tree.
async fn load(root: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let clean_path = path.trim_start_matches('/').replace("..", "");
    let mut file_path = Path::new(root).join(&clean_path);

    let root_canonical = match Path::new(root).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Served root not found or inaccessible '{root}': {e}"
            ));
            return None;
        }
    };

    // Directory requests serve the index document
    if file_path.is_dir() || clean_path.is_empty() || clean_path.ends_with('/') {
        file_path = file_path.join(INDEX_DOCUMENT);
    }

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let content_type =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            has_extension: false,
            is_head: false,
            access_log: false,
        }
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn serves_existing_file_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body {}").unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        let resp = serve(&ctx("/app.css"), &root).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/css");
        assert_eq!(body_bytes(resp).await, b"body {}");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let resp = serve(&ctx("/missing.js"), &root).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn root_request_serves_index_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>home</html>").unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        let resp = serve(&ctx("/"), &root).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await, b"<html>home</html>");
    }

    #[tokio::test]
    async fn traversal_cannot_escape_root() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let root_dir = outer.path().join("www");
        std::fs::create_dir(&root_dir).unwrap();

        let root = root_dir.to_string_lossy().into_owned();
        let resp = serve(&ctx("/../secret.txt"), &root).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn fallback_transfers_index_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>spa</html>").unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        let resp = serve_fallback(&ctx("/dashboard"), &root).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
        assert_eq!(body_bytes(resp).await, b"<html>spa</html>");
    }

    #[tokio::test]
    async fn missing_fallback_document_is_plain_404() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let resp = serve_fallback(&ctx("/dashboard"), &root).await;
        assert_eq!(resp.status(), 404);
    }
}
