use super::RouteMatcher;
use crate::definition::Protocol;
use crate::event::IncomingEvent;
use crate::route::CompiledRoute;

/// Matches if the route has no protocol restriction, or the restriction
/// agrees with whether the request arrived over a secure transport.
pub struct ProtocolMatcher;

impl RouteMatcher for ProtocolMatcher {
    fn matches(&self, route: &CompiledRoute, event: &dyn IncomingEvent) -> bool {
        match route.protocol {
            None => true,
            Some(Protocol::Https) => event.is_secure(),
            Some(Protocol::Http) => !event.is_secure(),
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
    fn https_only_rejects_plain_requests() {
        let mut def = RouteDefinition::leaf("/a", Method("GET".into()), action());
        def.protocol = Some(Protocol::Https);
        let route = CompiledRoute::compile(&def, true).unwrap();
        let plain = TestEvent::new("GET", "/a");
        let secure = TestEvent::new("GET", "/a").with_secure(true);
        assert!(!ProtocolMatcher.matches(&route, &plain));
        assert!(ProtocolMatcher.matches(&route, &secure));
    }
}
