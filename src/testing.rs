//! Test-only helpers for constructing [`IncomingEvent`]s without a real
//! transport, gated behind the `testing` feature (default-on, mirroring the
//! teacher's own `test-helpers`-style feature).

use std::collections::HashMap;

use crate::event::{Body, IncomingEvent};

/// A fully in-memory [`IncomingEvent`] for unit and integration tests.
///
/// Built with a small fluent API; unset fields take sensible defaults
/// (`GET`, no host, insecure, empty query/body/metadata).
#[derive(Debug, Clone)]
pub struct TestEvent {
    method: String,
    host: Option<String>,
    pathname: String,
    query: HashMap<String, String>,
    body: Body,
    secure: bool,
    metadata: HashMap<String, String>,
    cancelled: bool,
}

impl TestEvent {
    /// A new event with the given method and decoded pathname.
    pub fn new(method: impl Into<String>, pathname: impl Into<String>) -> Self {
        TestEvent {
            method: method.into(),
            host: None,
            pathname: pathname.into(),
            query: HashMap::new(),
            body: Body::default(),
            secure: false,
            metadata: HashMap::new(),
            cancelled: false,
        }
    }

    /// Sets the `Host`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets whether the event is considered to have arrived over TLS.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Adds one query-string entry.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Body(bytes.into());
        self
    }

    /// Adds one metadata entry (e.g. a stand-in header).
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Marks the event as already cancelled.
    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }
}

impl IncomingEvent for TestEvent {
    fn method(&self) -> &str {
        &self.method
    }

    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn decoded_pathname(&self) -> &str {
        &self.pathname
    }

    fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let event = TestEvent::new("GET", "/a");
        assert_eq!(event.method(), "GET");
        assert_eq!(event.host(), None);
        assert!(!event.is_secure());
        assert!(!event.is_cancelled());
    }

    #[test]
    fn builder_methods_apply() {
        let event = TestEvent::new("POST", "/a")
            .with_host("example.com")
            .with_secure(true)
            .with_query("q", "1")
            .with_metadata("X-Trace", "abc");
        assert_eq!(event.host(), Some("example.com"));
        assert!(event.is_secure());
        assert_eq!(event.query().get("q").map(String::as_str), Some("1"));
        assert_eq!(event.metadata("X-Trace"), Some("abc"));
    }
}
