//! Span helpers used when the `tracing` feature is enabled

use tracing::{debug_span, info_span, Span};

/// Span covering a full discovery pass over a medium
pub fn discovery_span(root: &str) -> Span {
    info_span!("tidemark.discover", root = %root)
}

/// Span covering a single content read
pub fn read_span(location: &str) -> Span {
    debug_span!("tidemark.read", location = %location)
}
