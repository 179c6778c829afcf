//! Error kinds produced by definition normalization, compilation, matching,
//! binding, dispatch, middleware execution, and URL generation.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::event::OutgoingResponse;

/// The single error type returned across the public API of this crate.
///
/// Every variant here corresponds to one of the error kinds enumerated in
/// the specification: malformed definitions are fatal at registration time,
/// while the rest are produced at dispatch or URL-generation time and have a
/// well-defined default HTTP status via [`RouterError::into_response`].
#[derive(Debug, Error)]
pub enum RouterError {
    /// A route definition was malformed, discovered during normalization or
    /// compilation. Fatal at registration time.
    #[error("invalid route definition: {0}")]
    Definition(String),

    /// No candidate route matched the request, or a named route does not
    /// exist for URL generation. Maps to HTTP 404.
    #[error("no route matched the request")]
    RouteNotFound,

    /// Candidate routes exist for the path and host, but none accept the
    /// request method. Maps to HTTP 405, with an `Allow` header listing
    /// `allowed`.
    #[error("method not allowed, allowed methods: {}", format_methods(.allowed))]
    MethodNotAllowed {
        /// The set of methods that would have matched.
        allowed: BTreeSet<String>,
    },

    /// URL generation was attempted without a value for a required
    /// parameter and no default was declared.
    #[error("missing required parameter `{0}` for URL generation")]
    MissingParam(String),

    /// A parameter value supplied to URL generation failed the segment's
    /// rule (regex).
    #[error("value for parameter `{name}` violates its rule: `{value}`")]
    RuleViolation {
        /// The offending parameter's name.
        name: String,
        /// The offending value.
        value: String,
    },

    /// The matched route's handler descriptor could not be dispatched (no
    /// handler instance available, or the named action does not exist).
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// A middleware pipe raised an error instead of producing a response or
    /// calling through to the next pipe.
    #[error("middleware error: {0}")]
    Middleware(String),

    /// The dispatch was cancelled by the inbound event before it completed.
    #[error("dispatch was cancelled")]
    Cancelled,
}

fn format_methods(methods: &BTreeSet<String>) -> String {
    methods.iter().cloned().collect::<Vec<_>>().join(", ")
}

impl RouterError {
    /// Produce the crate's default HTTP-shaped response for this error.
    ///
    /// This is the only place the library has an opinion about status
    /// codes; callers that want different behavior (a JSON problem+details
    /// body, a custom 500 page, ...) should match on `RouterError` directly
    /// instead of calling this.
    pub fn into_response(self) -> OutgoingResponse {
        match self {
            RouterError::RouteNotFound => OutgoingResponse::new(404),
            RouterError::MethodNotAllowed { allowed } => {
                let mut res = OutgoingResponse::new(405);
                res.headers
                    .insert("Allow".to_string(), format_methods(&allowed));
                res
            }
            RouterError::Cancelled => OutgoingResponse::new(499),
            RouterError::Definition(_)
            | RouterError::MissingParam(_)
            | RouterError::RuleViolation { .. }
            | RouterError::Dispatch(_)
            | RouterError::Middleware(_) => OutgoingResponse::new(500),
        }
    }
}
