//! Flattens a hierarchical [`RouteDefinition`] tree into a list of leaf
//! definitions, merging parent fields into children per `SPEC_FULL.md` §4.1.

use crate::definition::{PathSpec, RouteDefinition};
use crate::error::RouterError;

/// Default nesting depth before normalization gives up with a definition
/// error, matching the reference default named in `SPEC_FULL.md` §4.1.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Flattens hierarchical definitions into leaves, enforcing `max_depth` and
/// validating each leaf once fully merged.
pub struct DefinitionNormalizer {
    max_depth: usize,
}

impl Default for DefinitionNormalizer {
    fn default() -> Self {
        DefinitionNormalizer {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DefinitionNormalizer {
    /// Builds a normalizer with a custom nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        DefinitionNormalizer { max_depth }
    }

    /// Normalizes a forest of top-level definitions into leaves.
    pub fn normalize(&self, roots: &[RouteDefinition]) -> Result<Vec<RouteDefinition>, RouterError> {
        let mut leaves = Vec::new();
        for root in roots {
            self.walk(root, None, 0, &mut leaves)?;
        }
        for leaf in &leaves {
            validate_leaf(leaf)?;
        }
        Ok(leaves)
    }

    fn walk(
        &self,
        node: &RouteDefinition,
        parent: Option<&RouteDefinition>,
        depth: usize,
        out: &mut Vec<RouteDefinition>,
    ) -> Result<(), RouterError> {
        if depth > self.max_depth {
            return Err(RouterError::Definition(format!(
                "route definition nesting exceeds max_depth of {}",
                self.max_depth
            )));
        }

        let merged = match parent {
            Some(parent) => merge(parent, node),
            None => node.clone(),
        };

        if merged.children.is_empty() {
            out.push(merged);
        } else {
            for child in &node.children {
                self.walk(child, Some(&merged), depth + 1, out)?;
            }
        }
        Ok(())
    }
}

/// Collapses consecutive `/` and ensures a single leading `/`.
fn normalize_path(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    let combined = match (parent, child) {
        (None, None) => return None,
        (Some(p), None) => format!("/{p}"),
        (None, Some(c)) => format!("/{c}"),
        (Some(p), Some(c)) => format!("/{p}/{c}"),
    };
    let mut collapsed = String::with_capacity(combined.len());
    let mut prev_slash = false;
    for ch in combined.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(ch);
    }
    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }
    Some(collapsed)
}

fn join_name(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    let joined = match (parent, child) {
        (None, None) => return None,
        (Some(p), None) => p.to_string(),
        (None, Some(c)) => c.to_string(),
        (Some(p), Some(c)) => format!("{p}.{c}"),
    };
    let trimmed = joined.trim_matches('.');
    let mut out = String::with_capacity(trimmed.len());
    let mut prev_dot = false;
    for ch in trimmed.chars() {
        if ch == '.' {
            if prev_dot {
                continue;
            }
            prev_dot = true;
        } else {
            prev_dot = false;
        }
        out.push(ch);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Merges `parent` into `child`, producing the definition the child carries
/// forward to its own children (or out as a leaf).
fn merge(parent: &RouteDefinition, child: &RouteDefinition) -> RouteDefinition {
    let parent_path = parent.path.as_ref().map(|p| single_path_str(p));
    let child_path = child.path.as_ref().map(|p| single_path_str(p));

    let path = match (&parent_path, &child_path) {
        (None, None) => None,
        _ => normalize_path(parent_path.as_deref(), child_path.as_deref())
            .map(PathSpec::Single),
    };

    let mut methods = parent.methods.clone();
    for m in &child.methods {
        if !methods.contains(m) {
            methods.push(m.clone());
        }
    }

    let mut middleware = parent.middleware.clone();
    for m in &child.middleware {
        if !middleware.contains(m) {
            middleware.push(m.clone());
        }
    }

    let mut exclude_middleware = parent.exclude_middleware.clone();
    for id in &child.exclude_middleware {
        if !exclude_middleware.contains(id) {
            exclude_middleware.push(*id);
        }
    }

    let mut rules = parent.rules.clone();
    rules.extend(child.rules.clone());

    let mut defaults = parent.defaults.clone();
    defaults.extend(child.defaults.clone());

    let mut bindings = parent.bindings.clone();
    bindings.extend(child.bindings.clone());

    let action = merge_action(parent, child);

    RouteDefinition {
        path,
        methods,
        name: join_name(parent.name.as_deref(), child.name.as_deref()),
        action,
        domain: child.domain.clone().or_else(|| parent.domain.clone()),
        protocol: child.protocol.or(parent.protocol),
        middleware,
        exclude_middleware,
        rules,
        defaults,
        bindings,
        strict: child.strict.or(parent.strict),
        fallback: child.fallback || parent.fallback,
        children: child.children.clone(),
    }
}

/// Merges action descriptors per the method-name-binding and
/// callable-concatenation rules in `SPEC_FULL.md` §4.1. This implementation
/// treats anything other than "child has no action of its own" as "child
/// wins", since `HandlerDescriptor` variants other than `Class` have no
/// notion of partial application against a parent class.
fn merge_action(
    parent: &RouteDefinition,
    child: &RouteDefinition,
) -> Option<crate::definition::HandlerDescriptor> {
    use crate::definition::HandlerDescriptor;
    match (&parent.action, &child.action) {
        (Some(HandlerDescriptor::Class { ctor, .. }), Some(HandlerDescriptor::Class { action, .. }))
            if action.is_some() =>
        {
            Some(HandlerDescriptor::Class {
                ctor: ctor.clone(),
                action: action.clone(),
            })
        }
        (_, Some(child_action)) => Some(child_action.clone()),
        (Some(parent_action), None) => Some(parent_action.clone()),
        (None, None) => None,
    }
}

fn single_path_str(spec: &PathSpec) -> String {
    match spec {
        PathSpec::Single(p) => p.clone(),
        PathSpec::Aliases(ps) => ps.first().cloned().unwrap_or_default(),
    }
}

fn validate_leaf(leaf: &RouteDefinition) -> Result<(), RouterError> {
    if leaf.path.is_none() {
        return Err(RouterError::Definition(
            "normalized leaf has no path".to_string(),
        ));
    }
    if leaf.methods.is_empty() {
        return Err(RouterError::Definition(
            "normalized leaf has no methods".to_string(),
        ));
    }
    if leaf.action.is_none() {
        return Err(RouterError::Definition(
            "normalized leaf has no action".to_string(),
        ));
    }
    Ok(())
}
