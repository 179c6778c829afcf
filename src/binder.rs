//! Extracts path/domain parameters from a matched route and resolves
//! bound ones through pluggable [`BindingResolver`]s, per `SPEC_FULL.md` §4.4.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use log::trace;

use crate::route::CompiledRoute;

/// A pluggable resolver turning a raw captured string into a domain value.
///
/// Mirrors the model-binding extension point described in `SPEC_FULL.md`
/// §4.4: resolvers are looked up by the `bindings[segment]` key and may
/// return asynchronously (e.g. to hit a database), matching the boxed-future
/// convention the rest of the crate uses for async extension points.
pub trait BindingResolver: Send + Sync {
    /// Resolves `raw_value` captured under `key`. Returning `None` signals
    /// "not found", which the binder downgrades to a route-unmatched
    /// outcome rather than an error.
    fn resolve<'a>(&'a self, key: &'a str, raw_value: &'a str) -> BoxFuture<'a, Option<String>>;
}

/// The outcome of extracting and resolving parameters for a matched route.
pub enum BindOutcome {
    /// All bindings resolved; `params` holds the final string values.
    Bound(HashMap<String, String>),
    /// At least one binding resolver returned "not found"; the caller must
    /// treat this route as unmatched and fall through to the alternates
    /// logic, not as a dispatch error.
    Unresolved,
}

/// Extracts raw capture values from the path (and, if present, the domain)
/// subject, applying segment defaults where a capture is absent, then
/// resolves any keys present in `route.bindings`.
pub async fn bind(
    route: &CompiledRoute,
    pattern_index: usize,
    path_subject: &str,
    host_subject: Option<&str>,
    resolvers: &HashMap<String, Box<dyn BindingResolver>>,
) -> BindOutcome {
    let pattern = &route.path_patterns[pattern_index];
    let mut raw = HashMap::new();

    if let Some(caps) = pattern.regex.captures(path_subject) {
        for (group, original_key) in &pattern.group_names {
            let value = caps
                .name(group)
                .map(|m| m.as_str().to_string())
                .or_else(|| route.defaults.get(original_key).cloned());
            if let Some(value) = value {
                raw.insert(original_key.clone(), value);
            }
        }
    }

    if let (Some(domain_pattern), Some(host)) = (&route.domain_pattern, host_subject) {
        if let Some(caps) = domain_pattern.regex.captures(host) {
            for (group, original_key) in &domain_pattern.group_names {
                if let Some(m) = caps.name(group) {
                    raw.insert(original_key.clone(), m.as_str().to_string());
                }
            }
        }
    }

    let mut resolved = HashMap::new();
    for (key, value) in raw {
        match route.bindings.get(&key) {
            Some(resolver_key) => match resolvers.get(resolver_key) {
                Some(resolver) => match resolver.resolve(&key, &value).await {
                    Some(entity) => {
                        resolved.insert(key, entity);
                    }
                    None => {
                        trace!("binding `{key}` via resolver `{resolver_key}` found no entity");
                        return BindOutcome::Unresolved;
                    }
                },
                None => {
                    resolved.insert(key, value);
                }
            },
            None => {
                resolved.insert(key, value);
            }
        }
    }

    BindOutcome::Bound(resolved)
}

/// Filters a bound parameter map down to entries with non-empty values,
/// matching the "separate helper exposes only non-nil entries" wording.
pub fn non_empty(params: &HashMap<String, String>) -> HashMap<String, String> {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HandlerDescriptor, Method, RouteDefinition};
    use std::sync::Arc;

    fn action() -> HandlerDescriptor {
        HandlerDescriptor::Callable(Arc::new(|_| crate::event::OutgoingResponse::new(200)))
    }

    #[tokio::test]
    async fn extracts_raw_captures_without_bindings() {
        let def = RouteDefinition::leaf("/users/:id", Method("GET".into()), action());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let resolvers = HashMap::new();
        match bind(&route, 0, "/users/42", None, &resolvers).await {
            BindOutcome::Bound(params) => assert_eq!(params.get("id").map(String::as_str), Some("42")),
            BindOutcome::Unresolved => panic!("expected bound"),
        }
    }

    #[tokio::test]
    async fn applies_default_for_absent_optional_segment() {
        let mut def = RouteDefinition::leaf("/archive/:year?", Method("GET".into()), action());
        def.defaults.insert("year".to_string(), "2024".to_string());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let resolvers = HashMap::new();
        match bind(&route, 0, "/archive", None, &resolvers).await {
            BindOutcome::Bound(params) => {
                assert_eq!(params.get("year").map(String::as_str), Some("2024"))
            }
            BindOutcome::Unresolved => panic!("expected bound"),
        }
    }

    struct NotFoundResolver;
    impl BindingResolver for NotFoundResolver {
        fn resolve<'a>(&'a self, _key: &'a str, _raw_value: &'a str) -> BoxFuture<'a, Option<String>> {
            Box::pin(async { None })
        }
    }

    #[tokio::test]
    async fn unresolved_binding_downgrades_to_unresolved() {
        let mut def = RouteDefinition::leaf("/users/:id", Method("GET".into()), action());
        def.bindings.insert("id".to_string(), "users".to_string());
        let route = CompiledRoute::compile(&def, true).unwrap();
        let mut resolvers: HashMap<String, Box<dyn BindingResolver>> = HashMap::new();
        resolvers.insert("users".to_string(), Box::new(NotFoundResolver));
        match bind(&route, 0, "/users/42", None, &resolvers).await {
            BindOutcome::Unresolved => {}
            BindOutcome::Bound(_) => panic!("expected unresolved"),
        }
    }
}
