//! Pluggable, ordered, short-circuiting matcher chain, per `SPEC_FULL.md` §4.3.

mod host;
mod method;
mod protocol;
mod uri;

pub use host::HostMatcher;
pub use method::MethodMatcher;
pub use protocol::ProtocolMatcher;
pub use uri::UriMatcher;

use crate::event::IncomingEvent;
use crate::route::CompiledRoute;

/// A single predicate in the matcher chain.
///
/// Built-ins run in the fixed order URI → host → method → protocol; callers
/// may append additional matchers, which run after the built-ins in
/// registration order.
pub trait RouteMatcher: Send + Sync {
    /// Returns whether `route` matches `event`. Implementations must be
    /// pure and side-effect free: a failed match tries the next candidate
    /// route, not the next matcher for the same route.
    fn matches(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool;

    /// Whether this matcher enforces the HTTP method, so the alternates
    /// computation in [`MatcherChain::matches_ignoring_method`] can skip it.
    /// Only [`MethodMatcher`] overrides this.
    fn is_method_matcher(&self) -> bool {
        false
    }
}

/// The built-in chain plus any additional matchers, run in order with
/// short-circuiting on the first `false`.
pub struct MatcherChain {
    matchers: Vec<Box<dyn RouteMatcher>>,
}

impl Default for MatcherChain {
    fn default() -> Self {
        MatcherChain {
            matchers: vec![
                Box::new(UriMatcher),
                Box::new(HostMatcher),
                Box::new(MethodMatcher),
                Box::new(ProtocolMatcher),
            ],
        }
    }
}

impl MatcherChain {
    /// An empty chain, for callers that want to supply their own built-ins.
    pub fn empty() -> Self {
        MatcherChain {
            matchers: Vec::new(),
        }
    }

    /// Appends a matcher to run after all currently configured matchers.
    pub fn push(&mut self, matcher: Box<dyn RouteMatcher>) {
        self.matchers.push(matcher);
    }

    /// Runs every matcher in order, short-circuiting on the first failure.
    pub fn matches(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool {
        self.matchers.iter().all(|m| m.matches(route, event))
    }

    /// Runs every matcher in the chain *except* the method matcher, used to
    /// compute the `alternates` set for 404/405/OPTIONS disambiguation (see
    /// `SPEC_FULL.md` §4.3 step 4a). Relies on built-in matchers being
    /// identifiable; additional non-built-in matchers still apply.
    pub fn matches_ignoring_method(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool {
        self.matchers
            .iter()
            .all(|m| m.is_method_matcher() || m.matches(route, event))
    }
}
