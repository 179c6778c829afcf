//! The interfaces this crate consumes from (and produces for) the transport
//! layer. Transport itself — socket acceptance, TLS, HTTP/1 or HTTP/2
//! framing — is out of scope; this module only defines the shape of the
//! request the router reads and the response it writes.

use std::collections::HashMap;

/// Opaque request body handed to handlers untouched.
///
/// The router never parses or inspects the body; it is carried through
/// [`crate::state::RouterContext`] for the terminal dispatcher to use.
#[derive(Debug, Clone, Default)]
pub struct Body(pub Vec<u8>);

/// Read-only view of an inbound request, as produced by the transport layer.
///
/// This is a trait rather than a concrete struct so that a host application
/// can adapt its own request type (from whatever HTTP crate it uses) without
/// copying data into a router-owned type first.
pub trait IncomingEvent: Send + Sync {
    /// The HTTP method, upper-case (`"GET"`, `"POST"`, ...).
    fn method(&self) -> &str;

    /// The `Host` the request was addressed to, if any.
    fn host(&self) -> Option<&str>;

    /// The percent-decoded request path, always starting with `/`.
    fn decoded_pathname(&self) -> &str;

    /// The parsed query string as a flat string-to-string map.
    fn query(&self) -> &HashMap<String, String>;

    /// The request body, exposed opaquely.
    fn body(&self) -> &Body;

    /// Whether the request arrived over a secure (TLS) transport.
    fn is_secure(&self) -> bool;

    /// Convenience equality check against `method()`, case-insensitive.
    fn is_method(&self, candidate: &str) -> bool {
        self.method().eq_ignore_ascii_case(candidate)
    }

    /// Arbitrary transport-supplied metadata lookup (headers, connection
    /// info, etc). Returns `None` for keys the transport does not provide.
    fn metadata(&self, key: &str) -> Option<&str>;

    /// Whether the in-flight dispatch driven by this event has been
    /// cancelled by its caller (e.g. the client disconnected).
    ///
    /// The default implementation never cancels; transports that support
    /// cancellation (e.g. via a `tokio::sync::Notify` wired to connection
    /// drop) should override this.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// The response this crate hands back to the transport layer.
///
/// `content` is intentionally untyped (`serde_json::Value`-free to avoid
/// forcing a body encoding): the transport's `outgoingResponseResolver`
/// equivalent decides how to serialize it onto the wire.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    /// The HTTP status code.
    pub status_code: u16,
    /// Response headers, insertion order is not significant.
    pub headers: HashMap<String, String>,
    /// The response payload. `None` represents an empty body.
    pub content: Option<ResponseContent>,
}

/// The concrete shapes a handler, dispatcher, or middleware may return as a
/// response body. Kept as a small enum rather than `Box<dyn Any>` so the
/// router can format diagnostic output (e.g. in tests) without downcasting.
#[derive(Debug, Clone)]
pub enum ResponseContent {
    /// Raw bytes, e.g. a pre-rendered body.
    Bytes(Vec<u8>),
    /// A UTF-8 string body.
    Text(String),
    /// Structured JSON, typically returned by component/class dispatchers.
    Json(serde_json::Value),
}

impl OutgoingResponse {
    /// A bare response with the given status and no body.
    pub fn new(status_code: u16) -> Self {
        OutgoingResponse {
            status_code,
            headers: HashMap::new(),
            content: None,
        }
    }

    /// A response with a text body.
    pub fn with_text(status_code: u16, body: impl Into<String>) -> Self {
        OutgoingResponse {
            status_code,
            headers: HashMap::new(),
            content: Some(ResponseContent::Text(body.into())),
        }
    }

    /// Sets a single header, replacing any existing value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// The bag of values handed to a handler: the inbound event, the matched
/// route's diagnostic name, bound path parameters, the query map, and the
/// body — exactly the `actionContext` described in the specification.
pub struct ActionContext<'a> {
    /// The inbound event.
    pub event: &'a dyn IncomingEvent,
    /// The name of the route that matched, if it has one.
    pub route_name: Option<&'a str>,
    /// Bound path parameters (post-binding, raw or resolved to a string
    /// representation — domain-entity resolution is modeled in
    /// `crate::binder`).
    pub params: &'a HashMap<String, String>,
    /// The query map, copied from the event for convenience.
    pub query: &'a HashMap<String, String>,
    /// The request body.
    pub body: &'a Body,
}
