//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the routing policy and the static asset
//! responder: content types, cache policy, and status response builders.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{build_404_response, build_405_response, build_options_response};
