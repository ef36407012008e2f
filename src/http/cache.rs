//! HTTP cache control module
//!
//! Asset-extension cache policy: fingerprinted build outputs (stylesheets,
//! scripts, images, icons, web fonts) get a long-lived immutable directive.
//! The header is decided purely from the request path, so it is applied even
//! when the underlying file is missing — harmless, since the error body
//! carries no cache-sensitive content.

/// Cache directive for immutable assets.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Extensions (with dot) treated as immutable assets.
const ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".mjs", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".ico", ".woff",
    ".woff2", ".ttf", ".otf", ".eot",
];

/// Does the request path name an immutable asset? Case-insensitive.
pub fn is_immutable_asset(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
