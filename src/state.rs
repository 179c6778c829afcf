//! Per-dispatch state, per `SPEC_FULL.md` §3/§4.9.

use std::collections::HashMap;

use uuid::Uuid;

use crate::event::{Body, OutgoingResponse};
use crate::route::RouteHandle;

/// The phases one dispatch moves through. `Pipelining` → `Dispatching` is
/// folded into a single transition here since it is unobservable
/// externally (a middleware short-circuit rewires straight to `Responded`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// The event has arrived; nothing has happened yet.
    Received,
    /// The matcher chain is being run against candidate routes.
    Matching,
    /// A route matched; binding has not started.
    Matched,
    /// Capture extraction and resolver invocation are in progress.
    Binding,
    /// The middleware pipeline (including the terminal dispatch) is running.
    Pipelining,
    /// A response was produced.
    Responded,
    /// The dispatch ended in an error at any stage.
    Failed,
}

/// Exclusively owned by one in-flight dispatch; released when `dispatch`
/// returns.
pub struct RouterContext<'a> {
    /// A per-dispatch identifier, useful for correlating log lines.
    pub request_id: Uuid,
    /// Current lifecycle state, for diagnostics and tests.
    pub state: DispatchState,
    /// The route selected during matching, once one has been.
    pub matched_route: Option<RouteHandle>,
    /// Bound path/domain parameters, populated after binding.
    pub params: HashMap<String, String>,
    /// The request's query-string map.
    pub query: &'a HashMap<String, String>,
    /// The request body.
    pub body: &'a Body,
    /// The produced response, set once dispatch completes.
    pub response: Option<OutgoingResponse>,
}

impl<'a> RouterContext<'a> {
    /// Starts a new context in the `Received` state with a fresh request id.
    pub fn new(query: &'a HashMap<String, String>, body: &'a Body) -> Self {
        RouterContext {
            request_id: Uuid::new_v4(),
            state: DispatchState::Received,
            matched_route: None,
            params: HashMap::new(),
            query,
            body,
            response: None,
        }
    }

    /// Advances the state machine. Does not validate the transition is
    /// legal; callers drive it in the fixed order documented on
    /// [`DispatchState`].
    pub fn transition(&mut self, next: DispatchState) {
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_received_with_a_request_id() {
        let query = HashMap::new();
        let body = Body::default();
        let ctx = RouterContext::new(&query, &body);
        assert_eq!(ctx.state, DispatchState::Received);
        assert!(!ctx.request_id.is_nil());
    }

    #[test]
    fn transitions_advance_state() {
        let query = HashMap::new();
        let body = Body::default();
        let mut ctx = RouterContext::new(&query, &body);
        ctx.transition(DispatchState::Matching);
        ctx.transition(DispatchState::Matched);
        assert_eq!(ctx.state, DispatchState::Matched);
    }
}
