//! [`CompiledRoute`], the immutable output of compiling one normalized leaf
//! [`RouteDefinition`](crate::definition::RouteDefinition).

use std::collections::HashSet;
use std::sync::Arc;

use crate::compiler::{self, CompiledPattern};
use crate::definition::{
    Bindings, Defaults, HandlerDescriptor, Method, MiddlewareRef, Protocol, RouteDefinition, Rules,
};
use crate::error::RouterError;

/// A compiled, immutable route: the segment model, one path regex per
/// alias, an optional domain regex, the method set, and cached metadata.
///
/// `CompiledRoute`s are owned by a [`crate::collection::RouteCollection`]
/// and shared immutably (behind an `Arc`) with the dispatcher and URL
/// generator, matching the ownership rule in `SPEC_FULL.md` §3: the router
/// exclusively owns the collection, and compiled routes never hold a
/// back-pointer to it.
pub struct CompiledRoute {
    /// Diagnostic + reverse-routing name.
    pub name: Option<String>,
    /// One compiled pattern per path alias; index 0 is preferred for
    /// reverse generation.
    pub path_patterns: Vec<CompiledPattern>,
    /// Compiled domain pattern, if the route is host-restricted.
    pub domain_pattern: Option<CompiledPattern>,
    /// Accepted methods.
    pub methods: HashSet<Method>,
    /// Restricts matching to one protocol, if set.
    pub protocol: Option<Protocol>,
    /// Whether this route is only considered once all non-fallback routes
    /// have failed to match.
    pub fallback: bool,
    /// Whether trailing-slash variants were rejected at compile time.
    pub strict: bool,
    /// The handler this route dispatches to.
    pub action: HandlerDescriptor,
    /// Per-route middleware to mix into the pipeline.
    pub middleware: Vec<MiddlewareRef>,
    /// Per-route middleware identities to drop from the assembled pipeline.
    pub exclude_middleware: Vec<u64>,
    /// Per-segment default values for optional segments.
    pub defaults: Defaults,
    /// Per-segment binding resolver keys.
    pub bindings: Bindings,
    /// Per-segment regex constraints, retained (beyond compilation) so the
    /// URL generator can re-validate a value supplied for reverse routing.
    pub rules: Rules,
    /// The full set of named parameters across path and domain segments,
    /// cached at compile time.
    pub param_names: Vec<String>,
}

impl CompiledRoute {
    /// Compiles one normalized leaf definition.
    ///
    /// The caller (`RouteCompiler`, see `crate::router::Router::register`)
    /// is responsible for supplying a definition that already satisfies the
    /// leaf invariants (single concrete `path`, non-empty `methods`, an
    /// `action`).
    pub fn compile(def: &RouteDefinition, default_strict: bool) -> Result<CompiledRoute, RouterError> {
        let path_spec = def
            .path
            .as_ref()
            .ok_or_else(|| RouterError::Definition("leaf definition is missing a path".to_string()))?;
        if def.methods.is_empty() {
            return Err(RouterError::Definition(
                "leaf definition has no methods".to_string(),
            ));
        }
        if def.action.is_none() {
            return Err(RouterError::Definition(
                "leaf definition has no action".to_string(),
            ));
        }

        let strict = def.strict.unwrap_or(default_strict);
        let aliases = path_spec.aliases();
        let path_patterns = compiler::compile_all(&aliases, &def.rules, strict)?;

        let domain_pattern = match &def.domain {
            Some(pattern) => Some(compiler::compile(pattern, &Rules::new(), true)?),
            None => None,
        };

        let mut param_names: Vec<String> = Vec::new();
        for pattern in &path_patterns {
            for name in pattern.param_names() {
                if !param_names.iter().any(|n| n == name) {
                    param_names.push(name.to_string());
                }
            }
        }
        if let Some(domain) = &domain_pattern {
            for name in domain.param_names() {
                if param_names.iter().any(|n| n == name) {
                    return Err(RouterError::Definition(format!(
                        "parameter `{name}` is declared in both the path and the domain"
                    )));
                }
                param_names.push(name.to_string());
            }
        }

        Ok(CompiledRoute {
            name: def.name.clone(),
            path_patterns,
            domain_pattern,
            methods: def.methods.iter().cloned().collect(),
            protocol: def.protocol,
            fallback: def.fallback,
            strict,
            action: def.action.clone().expect("checked above"),
            middleware: def.middleware.clone(),
            exclude_middleware: def.exclude_middleware.clone(),
            defaults: def.defaults.clone(),
            bindings: def.bindings.clone(),
            rules: def.rules.clone(),
            param_names,
        })
    }

    /// The preferred path for reverse generation: the first alias.
    pub fn preferred_path(&self) -> &CompiledPattern {
        &self.path_patterns[0]
    }

    /// Whether this route accepts the given method, honoring the implicit
    /// HEAD-via-GET rule from `SPEC_FULL.md` §3 invariant (c).
    pub fn accepts_method(&self, method: &str) -> bool {
        if self.methods.iter().any(|m| m.as_str() == method) {
            return true;
        }
        method.eq_ignore_ascii_case("HEAD") && self.methods.iter().any(|m| m.as_str() == "GET")
    }
}

/// A shared, immutable handle to a compiled route, as stored in the
/// collection and handed to matchers/dispatchers/the URL generator.
pub type RouteHandle = Arc<CompiledRoute>;
