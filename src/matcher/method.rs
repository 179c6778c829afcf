use super::RouteMatcher;
use crate::event::IncomingEvent;
use crate::route::CompiledRoute;

/// Matches if the route's method set contains the request method, with the
/// implicit HEAD-via-GET rule from `SPEC_FULL.md` §3 invariant (c).
pub struct MethodMatcher;

impl RouteMatcher for MethodMatcher {
    fn matches(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool {
        route.accepts_method(event.method())
    }

    fn is_method_matcher(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HandlerDescriptor, Method, RouteDefinition};
    use crate::testing::TestEvent;
    use std::sync::Arc;

    fn action() -> HandlerDescriptor {
        HandlerDescriptor::Callable(Arc::new(|_| crate::event::OutgoingResponse::new(200)))
    }

    #[test]
    fn head_implicitly_matches_get_routes() {
        let def = RouteDefinition::leaf("/a", Method("GET".into()), action());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let head = TestEvent::new("HEAD", "/a");
        assert!(MethodMatcher.matches(&route, &head));
    }

    #[test]
    fn rejects_unlisted_method() {
        let def = RouteDefinition::leaf("/a", Method("GET".into()), action());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let post = TestEvent::new("POST", "/a");
        assert!(!MethodMatcher.matches(&route, &post));
    }
}
