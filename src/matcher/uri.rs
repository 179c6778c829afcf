use super::RouteMatcher;
use crate::event::IncomingEvent;
use crate::route::CompiledRoute;

/// Matches if any of the route's compiled path aliases matches the
/// request's decoded pathname.
pub struct UriMatcher;

impl RouteMatcher for UriMatcher {
    fn matches(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool {
        let pathname = event.decoded_pathname();
        route
            .path_patterns
            .iter()
            .any(|p| p.regex.is_match(pathname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HandlerDescriptor, Method, RouteDefinition};
    use crate::testing::TestEvent;
    use std::sync::Arc;

    fn route(path: &str) -> CompiledRoute {
        let def = RouteDefinition::leaf(
            path,
            Method("GET".into()),
            HandlerDescriptor::Callable(Arc::new(|_| crate::event::OutgoingResponse::new(200))),
        );
        CompiledRoute::compile(&def, true).unwrap()
    }

    #[test]
    fn matches_one_of_several_aliases() {
        let route = route("/users/:id");
        let event = TestEvent::new("GET", "/users/42");
        assert!(UriMatcher.matches(&route, &event));
        let miss = TestEvent::new("GET", "/groups/42");
        assert!(!UriMatcher.matches(&route, &miss));
    }
}
