//! Status-capturing response sink
//!
//! Observes the status a delegated serve produced without altering the
//! response, so the routing policy can make a post-serve fallback decision.

use hyper::StatusCode;

/// Records the first status produced on behalf of one request.
///
/// Starts at 200 — the implicit default for responses that never explicitly
/// set a status. Later records are ignored; only the first one feeds the
/// fallback decision. The capture is owned by a single request and read once
/// after the delegate returns.
#[derive(Debug)]
pub struct StatusCapture {
    status: StatusCode,
    recorded: bool,
}

impl StatusCapture {
    pub const fn new() -> Self {
        Self {
            status: StatusCode::OK,
            recorded: false,
        }
    }

    pub fn record(&mut self, status: StatusCode) {
        if !self.recorded {
            self.status = status;
            self.recorded = true;
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl Default for StatusCapture {
    fn default() -> Self {
        Self::new()
    }
}
