use super::RouteMatcher;
use crate::event::IncomingEvent;
use crate::route::CompiledRoute;

/// Matches if the route has no domain restriction, or the request's `Host`
/// matches the compiled domain pattern.
pub struct HostMatcher;

impl RouteMatcher for HostMatcher {
    fn matches(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool {
        match &route.domain_pattern {
            None => true,
            Some(pattern) => match event.host() {
                Some(host) => pattern.regex.is_match(host),
                None => false,
            },
        }
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
    fn unrestricted_route_matches_any_host() {
        let def = RouteDefinition::leaf("/a", Method("GET".into()), action());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let event = TestEvent::new("GET", "/a");
        assert!(HostMatcher.matches(&route, &event));
    }

    #[test]
    fn domain_restricted_route_checks_host() {
        let mut def = RouteDefinition::leaf("/a", Method("GET".into()), action());
        def.domain = Some("api.example.com".to_string());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let matching = TestEvent::new("GET", "/a").with_host("api.example.com");
        let mismatched = TestEvent::new("GET", "/a").with_host("other.example.com");
        assert!(HostMatcher.matches(&route, &matching));
        assert!(!HostMatcher.matches(&route, &mismatched));
    }
}
