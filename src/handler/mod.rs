//! Request handling module
//!
//! Routing policy, status capture, and static file serving.

pub mod router;
pub mod static_files;
pub mod status;

pub use router::handle_request;
