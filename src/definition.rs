//! The declarative input data model: [`RouteDefinition`] trees as produced
//! by decorator scanning, config-file loading, or a fluent builder, before
//! [`crate::normalizer::DefinitionNormalizer`] flattens them into leaves.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::event::{ActionContext, OutgoingResponse};

/// A regex pattern, as a per-segment constraint (`rules`).
pub type Rule = String;

/// `rules[segment] = pattern`
pub type Rules = HashMap<String, Rule>;

/// `defaults[segment] = value`
pub type Defaults = HashMap<String, String>;

/// `bindings[segment] = resolver key`
///
/// The resolver itself is looked up by this key against whatever
/// `BindingResolver` table the `Router` was configured with; the
/// definition only names it, keeping `RouteDefinition` trivially
/// (de)serializable.
pub type Bindings = HashMap<String, String>;

/// The handler invoked once a route matches and is bound, expressed as a
/// tagged variant over the four dispatcher kinds the specification names.
#[derive(Clone)]
pub enum HandlerDescriptor {
    /// A bare function/closure invoked directly with the action context.
    Callable(Arc<dyn Fn(ActionContext<'_>) -> OutgoingResponse + Send + Sync>),
    /// A named class/struct, resolved through a [`crate::dispatch::HandlerResolver`]
    /// and invoked via `action` (defaults to `"handle"`).
    Class {
        /// The key the container resolves to an instance.
        ctor: String,
        /// The method name to invoke; `None` means the default (`"handle"`).
        action: Option<String>,
    },
    /// An opaque component reference the caller renders itself; the
    /// dispatcher returns the descriptor verbatim as the response payload.
    Component {
        /// Component/module identifier.
        module: String,
        /// Whether the component must be awaited via a lazy loader first.
        lazy: bool,
    },
    /// A redirect target, see [`RedirectTarget`].
    Redirect(RedirectTarget),
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerDescriptor::Callable(_) => f.write_str("HandlerDescriptor::Callable(..)"),
            HandlerDescriptor::Class { ctor, action } => f
                .debug_struct("HandlerDescriptor::Class")
                .field("ctor", ctor)
                .field("action", action)
                .finish(),
            HandlerDescriptor::Component { module, lazy } => f
                .debug_struct("HandlerDescriptor::Component")
                .field("module", module)
                .field("lazy", lazy)
                .finish(),
            HandlerDescriptor::Redirect(target) => f
                .debug_tuple("HandlerDescriptor::Redirect")
                .field(target)
                .finish(),
        }
    }
}

/// The target of a redirect-only route.
#[derive(Clone)]
pub enum RedirectTarget {
    /// Redirect unconditionally to this location with status 302.
    Location(String),
    /// Redirect to this location with an explicit status.
    LocationWithStatus {
        /// Redirect target.
        location: String,
        /// HTTP status code to use instead of 302.
        status: u16,
    },
    /// Compute the target at dispatch time. May itself return another
    /// `RedirectTarget`; the dispatcher follows at most one such
    /// recursion (see `SPEC_FULL.md` §9 open questions).
    Callable(Arc<dyn Fn(ActionContext<'_>) -> RedirectTarget + Send + Sync>),
}

impl fmt::Debug for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTarget::Location(loc) => f.debug_tuple("Location").field(loc).finish(),
            RedirectTarget::LocationWithStatus { location, status } => f
                .debug_struct("LocationWithStatus")
                .field("location", location)
                .field("status", status)
                .finish(),
            RedirectTarget::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// A middleware pipe reference attached to a route or registered globally.
///
/// `id` is the exclusion key: `RouteDefinition::exclude_middleware` removes
/// pipes by this identity, matching the source's reference-equality
/// semantics (`SPEC_FULL.md` §9).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MiddlewareRef {
    /// Stable identity used for exclusion matching and tie-break ordering.
    pub id: u64,
    /// Lower runs earlier; ties break by registration order.
    pub priority: i32,
}

impl MiddlewareRef {
    /// Creates a new reference with the given identity and priority.
    pub fn new(id: u64, priority: i32) -> Self {
        MiddlewareRef { id, priority }
    }
}

/// One HTTP verb. A thin wrapper instead of a bare `String` so the
/// whitelist mentioned in `SPEC_FULL.md` §4.1 ("preserving HTTP-verb
/// whitelist") has one place to live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Method(pub String);

impl Method {
    /// Canonicalizes arbitrary input into upper-case, validating it is one
    /// of the known HTTP verbs.
    pub fn parse(raw: &str) -> Option<Method> {
        const KNOWN: &[&str] = &[
            "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "TRACE", "CONNECT",
        ];
        let upper = raw.to_ascii_uppercase();
        if KNOWN.contains(&upper.as_str()) {
            Some(Method(upper))
        } else {
            None
        }
    }

    /// The bare string form, e.g. `"GET"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One path string or a list of aliases. Matching tries aliases in
/// declaration order; reverse generation prefers the first.
#[derive(Debug, Clone)]
pub enum PathSpec {
    /// A single path pattern.
    Single(String),
    /// Multiple alternate path patterns for the same route.
    Aliases(Vec<String>),
}

impl PathSpec {
    /// All alias strings, in declared order.
    pub fn aliases(&self) -> Vec<&str> {
        match self {
            PathSpec::Single(p) => vec![p.as_str()],
            PathSpec::Aliases(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

/// A single node in the hierarchical route definition tree. Before
/// compilation this is normalized by [`crate::normalizer::DefinitionNormalizer`]
/// into leaves, each of which has exactly one concrete path.
#[derive(Clone)]
pub struct RouteDefinition {
    /// Path or alias list for this node. `None` for a pure grouping node
    /// that exists only to share middleware/prefix/domain across children.
    pub path: Option<PathSpec>,
    /// Accepted methods. Empty for a grouping node.
    pub methods: Vec<Method>,
    /// Dotted route name, joined with parent names on normalization.
    pub name: Option<String>,
    /// The handler, if this definition is (or will become, once merged
    /// with an ancestor) directly dispatchable.
    pub action: Option<HandlerDescriptor>,
    /// Host pattern, using the same grammar as `path`.
    pub domain: Option<String>,
    /// Restrict this route (and its subtree) to `http` or `https`.
    pub protocol: Option<Protocol>,
    /// Per-route middleware to add.
    pub middleware: Vec<MiddlewareRef>,
    /// Per-route middleware identities to remove (by `MiddlewareRef::id`).
    pub exclude_middleware: Vec<u64>,
    /// Per-segment regex constraints.
    pub rules: Rules,
    /// Per-segment default values for optional segments.
    pub defaults: Defaults,
    /// Per-segment binding resolver keys.
    pub bindings: Bindings,
    /// Trailing-slash strictness; `None` inherits the router-wide default.
    pub strict: Option<bool>,
    /// Whether this route is only considered after all non-fallback routes
    /// have failed to match.
    pub fallback: bool,
    /// Nested definitions, merged with this node as their parent.
    pub children: Vec<RouteDefinition>,
}

/// The two protocols a route may be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// Plain HTTP only.
    Http,
    /// TLS-protected HTTP only.
    Https,
}

impl Default for RouteDefinition {
    fn default() -> Self {
        RouteDefinition {
            path: None,
            methods: Vec::new(),
            name: None,
            action: None,
            domain: None,
            protocol: None,
            middleware: Vec::new(),
            exclude_middleware: Vec::new(),
            rules: Rules::new(),
            defaults: Defaults::new(),
            bindings: Bindings::new(),
            strict: None,
            fallback: false,
            children: Vec::new(),
        }
    }
}

impl RouteDefinition {
    /// A grouping node used purely to carry shared fields to its children.
    pub fn group() -> Self {
        RouteDefinition::default()
    }

    /// A leaf definition for a single path/method/action combination.
    pub fn leaf(path: impl Into<String>, method: Method, action: HandlerDescriptor) -> Self {
        RouteDefinition {
            path: Some(PathSpec::Single(path.into())),
            methods: vec![method],
            action: Some(action),
            ..RouteDefinition::default()
        }
    }

    /// Builder-style method attachment of a name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style attachment of nested definitions.
    pub fn with_children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children = children;
        self
    }
}

/// A fluent surface for assembling a `RouteDefinition` tree in Rust code,
/// as an alternative to the data-driven `children` field for host
/// applications that would rather nest scopes than build trees by hand.
/// Mirrors the shape of the teacher's own `ScopeBuilder` / `DrawRoutes`
/// (`gotham/src/router/builder/draw.rs`): `scope` nests a sub-builder under
/// a path prefix, `route` attaches a single definition.
#[derive(Default)]
pub struct ScopeBuilder {
    definitions: Vec<RouteDefinition>,
}

impl ScopeBuilder {
    /// An empty scope.
    pub fn new() -> Self {
        ScopeBuilder::default()
    }

    /// Attaches a single definition, leaf or group, to this scope.
    pub fn route(&mut self, def: RouteDefinition) -> &mut Self {
        self.definitions.push(def);
        self
    }

    /// Nests a sub-scope under `prefix`. `build` receives the nested
    /// builder; whatever it collects becomes the group's `children`.
    pub fn scope(&mut self, prefix: impl Into<String>, build: impl FnOnce(&mut ScopeBuilder)) -> &mut Self {
        let mut nested = ScopeBuilder::new();
        build(&mut nested);
        let mut group = RouteDefinition::group();
        group.path = Some(PathSpec::Single(prefix.into()));
        group.children = nested.into_definitions();
        self.definitions.push(group);
        self
    }

    /// Consumes the builder, returning the definitions collected so far.
    pub fn into_definitions(self) -> Vec<RouteDefinition> {
        self.definitions
    }
}
