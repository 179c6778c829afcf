//! Indexed registry of compiled routes, per `SPEC_FULL.md` §3/§4.3.

use std::collections::HashMap;

use log::warn;

use crate::route::{CompiledRoute, RouteHandle};

/// A conflict reported when two routes register the same (method, path-key)
/// pair. The collection keeps the most recently inserted route (last write
/// wins) and reports the conflict to the caller rather than failing the
/// registration, matching `SPEC_FULL.md` §3's "the core reports; the caller
/// decides" wording.
#[derive(Debug, Clone)]
pub struct RouteConflict {
    /// The HTTP method the conflict occurred under.
    pub method: String,
    /// The literal path source that collided.
    pub path_key: String,
}

/// Insertion-ordered storage of compiled routes with the indices the
/// matcher, URL generator, and dispatcher registry all need.
#[derive(Default)]
pub struct RouteCollection {
    routes: Vec<RouteHandle>,
    by_method_path: HashMap<(String, String), usize>,
    by_name: HashMap<String, usize>,
    conflicts: Vec<RouteConflict>,
}

impl RouteCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        RouteCollection::default()
    }

    /// Inserts a compiled route, indexing it under every (method, path
    /// alias) pair and, if named, under its name.
    ///
    /// On a (method, path-key) collision the new route replaces the old one
    /// in the index (the old route remains reachable via `routes()` but is
    /// no longer matched), and the collision is recorded in
    /// [`RouteCollection::conflicts`].
    pub fn insert(&mut self, route: CompiledRoute) -> RouteHandle {
        let handle: RouteHandle = std::sync::Arc::new(route);
        let idx = self.routes.len();
        self.routes.push(handle.clone());

        for method in &handle.methods {
            for pattern in &handle.path_patterns {
                let key = (method.as_str().to_string(), pattern.source.clone());
                if let Some(&existing) = self.by_method_path.get(&key) {
                    if existing != idx {
                        warn!(
                            "route conflict: method={} path={} replaces a previously registered route",
                            key.0, key.1
                        );
                        self.conflicts.push(RouteConflict {
                            method: key.0.clone(),
                            path_key: key.1.clone(),
                        });
                    }
                }
                self.by_method_path.insert(key, idx);
            }
        }

        if let Some(name) = &handle.name {
            self.by_name.insert(name.clone(), idx);
        }

        handle
    }

    /// All routes, in insertion order, including any since-shadowed by a
    /// conflicting later insert.
    pub fn routes(&self) -> &[RouteHandle] {
        &self.routes
    }

    /// Routes whose `methods` contains `method`, plus GET routes when
    /// `method` is HEAD, in insertion order with non-fallback routes first.
    pub fn candidates_for_method(&self, method: &str) -> Vec<RouteHandle> {
        let mut matching: Vec<RouteHandle> = self
            .routes
            .iter()
            .filter(|r| r.accepts_method(method))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.fallback);
        matching
    }

    /// All distinct methods any route would match against `path`, used to
    /// build the `alternates` set for 405/OPTIONS handling. The caller is
    /// responsible for actually re-running the non-method matchers; this
    /// only gives the distinct candidate method universe to iterate.
    pub fn known_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self
            .routes
            .iter()
            .flat_map(|r| r.methods.iter().map(|m| m.as_str().to_string()))
            .collect();
        methods.sort();
        methods.dedup();
        methods
    }

    /// Looks up a route by its dotted name.
    pub fn find_by_name(&self, name: &str) -> Option<RouteHandle> {
        self.by_name.get(name).map(|&idx| self.routes[idx].clone())
    }

    /// Conflicts observed since construction, oldest first.
    pub fn conflicts(&self) -> &[RouteConflict] {
        &self.conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HandlerDescriptor, Method, RouteDefinition};
    use crate::route::CompiledRoute;
    use std::sync::Arc;

    fn action() -> HandlerDescriptor {
        HandlerDescriptor::Callable(Arc::new(|_| crate::event::OutgoingResponse::new(200)))
    }

    fn compiled(path: &str, method: &str, name: Option<&str>) -> CompiledRoute {
        let mut def = RouteDefinition::leaf(path, Method(method.into()), action());
        def.name = name.map(String::from);
        CompiledRoute::compile(&def, true).unwrap()
    }

    #[test]
    fn indexes_by_name_and_method() {
        let mut coll = RouteCollection::new();
        coll.insert(compiled("/a", "GET", Some("a.show")));
        assert!(coll.find_by_name("a.show").is_some());
        assert_eq!(coll.candidates_for_method("GET").len(), 1);
        assert_eq!(coll.candidates_for_method("POST").len(), 0);
    }

    #[test]
    fn head_falls_back_to_get() {
        let mut coll = RouteCollection::new();
        coll.insert(compiled("/a", "GET", None));
        assert_eq!(coll.candidates_for_method("HEAD").len(), 1);
    }

    #[test]
    fn reports_conflicts_on_duplicate_method_path() {
        let mut coll = RouteCollection::new();
        coll.insert(compiled("/a", "GET", Some("one")));
        coll.insert(compiled("/a", "GET", Some("two")));
        assert_eq!(coll.conflicts().len(), 1);
    }

    #[test]
    fn fallback_routes_sort_after_non_fallback() {
        let mut coll = RouteCollection::new();
        let mut fallback_def = RouteDefinition::leaf("/:rest*", Method("GET".into()), action());
        fallback_def.fallback = true;
        coll.insert(CompiledRoute::compile(&fallback_def, true).unwrap());
        coll.insert(compiled("/a", "GET", None));
        let candidates = coll.candidates_for_method("GET");
        assert!(!candidates[0].fallback);
        assert!(candidates[1].fallback);
    }
}
