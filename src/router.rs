//! The facade orchestrating normalization, compilation, matching, binding,
//! the middleware pipeline, and URL generation, per `SPEC_FULL.md` §4.8.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::binder::{self, BindOutcome, BindingResolver};
use crate::collection::RouteCollection;
use crate::definition::{Defaults, MiddlewareRef, RouteDefinition, Rules};
use crate::dispatch::{self, HandlerResolver};
use crate::error::RouterError;
use crate::event::{ActionContext, Body, IncomingEvent, OutgoingResponse};
use crate::matcher::MatcherChain;
use crate::middleware::{Middleware, Pipeline};
use crate::normalizer::DefinitionNormalizer;
use crate::route::RouteHandle;
use crate::state::{DispatchState, RouterContext};
use crate::urlgen::{self, GenerateOptions};

/// Names of the two observable events fired during dispatch. Kept as
/// constants rather than the reference's own naming so that a host
/// application's event-bus wiring names a stable crate API instead of a
/// borrowed identifier.
pub const EVENT_ROUTING: &str = "router.routing";
pub const EVENT_ROUTE_MATCHED: &str = "router.route_matched";

/// Receives the two dispatch-lifecycle notifications. The event bus itself
/// is out of scope (`SPEC_FULL.md` §1); this is the interface the router
/// emits through.
pub trait EventObserver: Send + Sync {
    /// Fired once per dispatch, before matching starts.
    fn on_routing(&self, _event_name: &str) {}

    /// Fired once per dispatch, after a route has successfully matched.
    fn on_route_matched(&self, _event_name: &str, _route: &RouteHandle) {}
}

/// A no-op observer, the default when none is configured.
struct NullObserver;
impl EventObserver for NullObserver {}

/// Configuration accepted at construction time, matching the key list in
/// `SPEC_FULL.md` §6.
pub struct RouterConfig {
    /// Path prepended to every registered route.
    pub prefix: Option<String>,
    /// Default strict-mode flag for routes that don't set their own.
    pub strict: bool,
    /// Maximum definition nesting depth.
    pub max_depth: usize,
    /// Bypass all middleware for every dispatch when true.
    pub skip_middleware: bool,
    /// Global per-parameter regex rules, overridden by route-level rules.
    pub rules: Rules,
    /// Global parameter defaults, overridden by route-level defaults.
    pub defaults: Defaults,
    /// Global parameter binding resolver keys, overridden by route-level
    /// bindings.
    pub bindings: HashMap<String, String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            prefix: None,
            strict: false,
            max_depth: crate::normalizer::DEFAULT_MAX_DEPTH,
            skip_middleware: false,
            rules: Rules::new(),
            defaults: Defaults::new(),
            bindings: HashMap::new(),
        }
    }
}

/// Builds a [`Router`] from a [`RouterConfig`] plus the pluggable
/// collaborators: additional matchers, global middleware, binding
/// resolvers, a handler resolver (DI container stand-in), an event
/// observer, and the initial set of definitions.
#[derive(Default)]
pub struct RouterBuilder {
    config: RouterConfig,
    extra_matchers: Vec<Box<dyn crate::matcher::RouteMatcher>>,
    global_middleware: Vec<(Arc<dyn Middleware>, MiddlewareRef)>,
    middleware_registry: HashMap<u64, Arc<dyn Middleware>>,
    binding_resolvers: HashMap<String, Box<dyn BindingResolver>>,
    handler_resolver: Option<Box<dyn HandlerResolver>>,
    observer: Option<Box<dyn EventObserver>>,
    definitions: Vec<RouteDefinition>,
}

impl RouterBuilder {
    /// Starts from a given config, overriding the defaults.
    pub fn with_config(config: RouterConfig) -> Self {
        RouterBuilder {
            config,
            ..RouterBuilder::default()
        }
    }

    /// Appends a matcher run after the four built-ins.
    pub fn matcher(mut self, matcher: Box<dyn crate::matcher::RouteMatcher>) -> Self {
        self.extra_matchers.push(matcher);
        self
    }

    /// Registers a global middleware pipe with its priority. Runs for every
    /// dispatch unless a route excludes it by id.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>, priority: i32) -> Self {
        let id = middleware.id();
        self.middleware_registry.insert(id, middleware.clone());
        self.global_middleware
            .push((middleware, MiddlewareRef::new(id, priority)));
        self
    }

    /// Registers a middleware pipe available for route-level `middleware`
    /// references (`RouteDefinition::middleware`) without running it
    /// globally; only routes that reference its id by a [`MiddlewareRef`]
    /// include it in their pipeline.
    pub fn route_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware_registry.insert(middleware.id(), middleware);
        self
    }

    /// Registers a binding resolver under `key`.
    pub fn binding_resolver(mut self, key: impl Into<String>, resolver: Box<dyn BindingResolver>) -> Self {
        self.binding_resolvers.insert(key.into(), resolver);
        self
    }

    /// Sets the handler resolver used by `ClassDispatcher`.
    pub fn handler_resolver(mut self, resolver: Box<dyn HandlerResolver>) -> Self {
        self.handler_resolver = Some(resolver);
        self
    }

    /// Sets the event observer.
    pub fn observer(mut self, observer: Box<dyn EventObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Queues definitions for registration at `build()` time.
    pub fn definitions(mut self, definitions: Vec<RouteDefinition>) -> Self {
        self.definitions = definitions;
        self
    }

    /// Queues a nested group of definitions under `prefix`, assembled via a
    /// [`crate::definition::ScopeBuilder`], mirroring the teacher's
    /// `DrawRoutes::scope`.
    pub fn scope(mut self, prefix: impl Into<String>, build: impl FnOnce(&mut crate::definition::ScopeBuilder)) -> Self {
        let mut nested = crate::definition::ScopeBuilder::new();
        build(&mut nested);
        let mut group = RouteDefinition::group();
        group.path = Some(crate::definition::PathSpec::Single(prefix.into()));
        group.children = nested.into_definitions();
        self.definitions.push(group);
        self
    }

    /// Queues a group of definitions that share no path prefix of their
    /// own, only whatever fields the caller attaches inside `build`,
    /// mirroring the teacher's `DrawRoutes::associate`.
    pub fn group(mut self, build: impl FnOnce(&mut crate::definition::ScopeBuilder)) -> Self {
        let mut nested = crate::definition::ScopeBuilder::new();
        build(&mut nested);
        self.definitions.extend(nested.into_definitions());
        self
    }

    /// Normalizes, compiles, and indexes every queued definition, producing
    /// a ready-to-serve [`Router`].
    pub fn build(self) -> Result<Router, RouterError> {
        let mut matchers = MatcherChain::default();
        for m in self.extra_matchers {
            matchers.push(m);
        }

        let mut router = Router {
            collection: RouteCollection::new(),
            normalizer: DefinitionNormalizer::with_max_depth(self.config.max_depth),
            matchers,
            global_middleware: self.global_middleware,
            middleware_registry: self.middleware_registry,
            binding_resolvers: self.binding_resolvers,
            handler_resolver: self.handler_resolver,
            observer: self.observer.unwrap_or_else(|| Box::new(NullObserver)),
            config: self.config,
        };

        for def in self.definitions {
            router.register(def)?;
        }

        Ok(router)
    }
}

/// The routing and dispatch facade.
pub struct Router {
    collection: RouteCollection,
    normalizer: DefinitionNormalizer,
    matchers: MatcherChain,
    global_middleware: Vec<(Arc<dyn Middleware>, MiddlewareRef)>,
    middleware_registry: HashMap<u64, Arc<dyn Middleware>>,
    binding_resolvers: HashMap<String, Box<dyn BindingResolver>>,
    handler_resolver: Option<Box<dyn HandlerResolver>>,
    observer: Box<dyn EventObserver>,
    config: RouterConfig,
}

impl Router {
    /// A router with no definitions registered yet, using default config.
    pub fn new() -> Self {
        RouterBuilder::default().build().expect("empty build cannot fail")
    }

    /// Normalizes, compiles, and indexes `def` (and its subtree), applying
    /// the router's configured `prefix`/`strict`/`rules`/`defaults`/
    /// `bindings` as the implicit root ancestor.
    pub fn register(&mut self, def: RouteDefinition) -> Result<(), RouterError> {
        let mut root = RouteDefinition::group();
        if let Some(prefix) = &self.config.prefix {
            root.path = Some(crate::definition::PathSpec::Single(prefix.clone()));
        }
        root.strict = Some(self.config.strict);
        root.rules = self.config.rules.clone();
        root.defaults = self.config.defaults.clone();
        root.bindings = self
            .config
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        root.children = vec![def];

        let leaves = self.normalizer.normalize(&[root])?;
        for leaf in leaves {
            let compiled = crate::route::CompiledRoute::compile(&leaf, self.config.strict)?;
            debug!(
                "registered route name={:?} methods={:?}",
                compiled.name, compiled.methods
            );
            self.collection.insert(compiled);
        }
        Ok(())
    }

    /// Matches, binds, pipelines, and dispatches `event`, returning the
    /// resulting response or a [`RouterError`].
    pub async fn dispatch(&self, event: &dyn IncomingEvent) -> Result<OutgoingResponse, RouterError> {
        self.observer.on_routing(EVENT_ROUTING);
        let query = event.query().clone();
        let body = event.body().clone();
        let mut ctx = RouterContext::new(&query, &body);
        trace!(
            "dispatch {} started method={} path={}",
            ctx.request_id,
            event.method(),
            event.decoded_pathname()
        );

        if event.is_cancelled() {
            ctx.transition(DispatchState::Failed);
            return Err(RouterError::Cancelled);
        }

        ctx.transition(DispatchState::Matching);

        let candidates = self.collection.candidates_for_method(event.method());
        let mut matched: Option<(RouteHandle, usize, HashMap<String, String>)> = None;

        for route in &candidates {
            let Some(pattern_index) = route
                .path_patterns
                .iter()
                .position(|p| p.regex.is_match(event.decoded_pathname()))
            else {
                continue;
            };
            if !self.matchers.matches(route, event) {
                continue;
            }

            if event.is_cancelled() {
                ctx.transition(DispatchState::Failed);
                return Err(RouterError::Cancelled);
            }

            ctx.transition(DispatchState::Binding);
            let outcome = binder::bind(
                route,
                pattern_index,
                event.decoded_pathname(),
                event.host(),
                &self.binding_resolvers,
            )
            .await;

            match outcome {
                BindOutcome::Bound(params) => {
                    matched = Some((route.clone(), pattern_index, params));
                    break;
                }
                BindOutcome::Unresolved => continue,
            }
        }

        let (route, _pattern_index, params) = match matched {
            Some(m) => m,
            None => {
                let outcome = self.resolve_unmatched(event);
                ctx.transition(match &outcome {
                    Ok(_) => DispatchState::Responded,
                    Err(_) => DispatchState::Failed,
                });
                return outcome;
            }
        };

        ctx.transition(DispatchState::Matched);
        ctx.matched_route = Some(route.clone());
        self.observer.on_route_matched(EVENT_ROUTE_MATCHED, &route);

        if event.is_cancelled() {
            ctx.transition(DispatchState::Failed);
            return Err(RouterError::Cancelled);
        }

        ctx.transition(DispatchState::Pipelining);
        let route_name = route.name.clone();

        let response = self
            .run_pipeline(&route, event, &params, &query, &body, route_name.as_deref())
            .await;

        match response {
            Ok(resp) => {
                ctx.transition(DispatchState::Responded);
                ctx.response = Some(resp.clone());
                trace!("dispatch {} responded status={}", ctx.request_id, resp.status_code);
                Ok(resp)
            }
            Err(err) => {
                ctx.transition(DispatchState::Failed);
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        route: &RouteHandle,
        event: &dyn IncomingEvent,
        params: &HashMap<String, String>,
        query: &HashMap<String, String>,
        body: &Body,
        route_name: Option<&str>,
    ) -> Result<OutgoingResponse, RouterError> {
        let action = route.action.clone();
        let resolver = self.handler_resolver.as_deref();

        let terminal = move |ctx: ActionContext<'_>| -> crate::middleware::MiddlewareFuture<'_> {
            Box::pin(async move { dispatch::dispatch(&action, resolver, ctx).await })
        };

        let make_ctx = |route_name: Option<&'_ str>| ActionContext {
            event,
            route_name,
            params,
            query,
            body,
        };

        if self.config.skip_middleware {
            return terminal(make_ctx(route_name)).await;
        }

        let registry = |id: u64| -> Option<Arc<dyn Middleware>> { self.middleware_registry.get(&id).cloned() };
        let pipeline = Pipeline::assemble(
            &self.global_middleware,
            &route.middleware,
            &route.exclude_middleware,
            &registry,
        );

        pipeline.run(make_ctx(route_name), terminal).await
    }

    /// Implements `SPEC_FULL.md` §4.3 step 4: computes the `alternates` set
    /// of methods that would have matched ignoring method, and resolves to
    /// either a synthesized `OPTIONS` response, a 405, or a 404.
    fn resolve_unmatched(&self, event: &dyn IncomingEvent) -> Result<OutgoingResponse, RouterError> {
        // A route that matched URI+host+protocol+method but whose resolver
        // then failed to bind (`BindOutcome::Unresolved`) also falls through
        // to here. Per SPEC_FULL.md §4.4/§7 that case must read as a plain
        // 404, not as "this route is an alternate for some other method" —
        // so the request's own method (and its HEAD/GET alias, since a
        // GET-accepting route already answers HEAD) never counts itself as
        // an alternate.
        let mut alternates = std::collections::BTreeSet::new();
        for route in self.collection.routes() {
            let uri_host_protocol_match = route
                .path_patterns
                .iter()
                .any(|p| p.regex.is_match(event.decoded_pathname()))
                && self.matchers.matches_ignoring_method(route, event);
            if uri_host_protocol_match {
                for m in &route.methods {
                    if event.is_method(m.as_str()) || (event.is_method("HEAD") && m.as_str() == "GET") {
                        continue;
                    }
                    alternates.insert(m.as_str().to_string());
                }
            }
        }

        if !alternates.is_empty() && event.is_method("OPTIONS") {
            let allowed = alternates.into_iter().collect::<Vec<_>>().join(", ");
            return Ok(OutgoingResponse::new(200).header("Allow", allowed));
        }

        if !alternates.is_empty() {
            Err(RouterError::MethodNotAllowed { allowed: alternates })
        } else {
            Err(RouterError::RouteNotFound)
        }
    }

    /// Builds a URL for the named route.
    pub fn generate(&self, opts: &GenerateOptions<'_>) -> Result<String, RouterError> {
        urlgen::generate(&self.collection, opts)
    }

    /// Looks up a route by its dotted name.
    pub fn find_by_name(&self, name: &str) -> Option<RouteHandle> {
        self.collection.find_by_name(name)
    }

    /// Looks up a route by its handler identity: the `ctor` of a `Class`
    /// descriptor, or the `module` of a `Component` descriptor.
    pub fn find_by_action(&self, key: &str) -> Option<RouteHandle> {
        self.collection.routes().iter().find(|r| match &r.action {
            crate::definition::HandlerDescriptor::Class { ctor, .. } => ctor == key,
            crate::definition::HandlerDescriptor::Component { module, .. } => module == key,
            _ => false,
        }).cloned()
    }

    /// One record per (method, route), sorted by path, with implicit HEAD
    /// aliases of GET elided.
    pub fn dump_routes(&self) -> Vec<RouteDump> {
        let mut rows = Vec::new();
        for route in self.collection.routes() {
            for pattern in &route.path_patterns {
                for method in &route.methods {
                    rows.push(RouteDump {
                        method: method.as_str().to_string(),
                        path: pattern.source.clone(),
                        name: route.name.clone(),
                    });
                }
            }
        }
        rows.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));
        rows
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

/// One row of [`Router::dump_routes`]'s diagnostic output.
#[derive(Debug, Clone)]
pub struct RouteDump {
    pub method: String,
    pub path: String,
    pub name: Option<String>,
}

impl std::fmt::Display for RouteDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<7} {:<40} {}",
            self.method,
            self.path,
            self.name.as_deref().unwrap_or("-")
        )
    }
}
