//! Reverse routing: builds a URL from a route name plus parameters, the
//! inverse of [`crate::compiler`], per `SPEC_FULL.md` §4.7.

use std::collections::HashMap;

use crate::collection::RouteCollection;
use crate::error::RouterError;
use crate::route::CompiledRoute;
use crate::segment::Segment;

/// Input to [`generate`].
#[derive(Debug, Default, Clone)]
pub struct GenerateOptions<'a> {
    /// The route's dotted name.
    pub name: &'a str,
    /// Path/domain parameter values.
    pub params: HashMap<String, String>,
    /// Extra query-string members, appended after unconsumed `params`.
    pub query: HashMap<String, String>,
    /// Fragment, appended as `#hash` if present.
    pub hash: Option<&'a str>,
    /// Overrides the route's own protocol when generating an absolute URL.
    pub protocol: Option<&'a str>,
    /// When true, prefixes `protocol://host` built from the route's domain.
    pub with_domain: bool,
}

/// Builds a URL for the named route, substituting `params` into its
/// preferred path pattern.
pub fn generate(collection: &RouteCollection, opts: &GenerateOptions<'_>) -> Result<String, RouterError> {
    let route = collection
        .find_by_name(opts.name)
        .ok_or(RouterError::RouteNotFound)?;

    let mut consumed: Vec<String> = Vec::new();
    let path = render_pattern(&route, opts, &mut consumed)?;

    let mut url = String::new();
    if opts.with_domain {
        let protocol = opts
            .protocol
            .map(str::to_string)
            .or_else(|| route.protocol.map(|p| match p {
                crate::definition::Protocol::Https => "https".to_string(),
                crate::definition::Protocol::Http => "http".to_string(),
            }))
            .unwrap_or_else(|| "http".to_string());
        let host = match &route.domain_pattern {
            Some(pattern) => render_domain(pattern, opts, &mut consumed)?,
            None => {
                return Err(RouterError::Definition(
                    "with_domain requested but route has no domain".to_string(),
                ))
            }
        };
        url.push_str(&protocol);
        url.push_str("://");
        url.push_str(&host);
    }
    url.push_str(&path);

    let mut query_pairs: Vec<(String, String)> = opts
        .params
        .iter()
        .filter(|(k, _)| !consumed.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    query_pairs.extend(opts.query.iter().map(|(k, v)| (k.clone(), v.clone())));

    if !query_pairs.is_empty() {
        let encoded: Vec<String> = query_pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect();
        url.push('?');
        url.push_str(&encoded.join("&"));
    }

    if let Some(hash) = opts.hash {
        url.push('#');
        url.push_str(hash);
    }

    Ok(url)
}

fn render_pattern(
    route: &CompiledRoute,
    opts: &GenerateOptions<'_>,
    consumed: &mut Vec<String>,
) -> Result<String, RouterError> {
    let pattern = route.preferred_path();
    let mut out = String::new();
    for segment in &pattern.segments {
        out.push('/');
        match segment {
            Segment::Static(lit) => out.push_str(lit),
            Segment::Dynamic {
                name,
                alias,
                prefix,
                suffix,
                quantifier,
                ..
            } => {
                let key = alias.as_deref().unwrap_or(name);
                let value = opts
                    .params
                    .get(key)
                    .cloned()
                    .or_else(|| route.defaults.get(key).cloned());
                let value = match value {
                    Some(v) => v,
                    None if quantifier.allows_absence() => {
                        out.pop();
                        continue;
                    }
                    None => return Err(RouterError::MissingParam(key.to_string())),
                };
                if let Some(rule) = route_rule(route, name) {
                    let anchored = format!("^{rule}$");
                    let re = regex::Regex::new(&anchored).map_err(|e| {
                        RouterError::Definition(format!("invalid rule for `{name}`: {e}"))
                    })?;
                    if !re.is_match(&value) {
                        return Err(RouterError::RuleViolation {
                            name: key.to_string(),
                            value: value.clone(),
                        });
                    }
                }
                out.push_str(prefix);
                out.push_str(&value);
                out.push_str(suffix);
                consumed.push(key.to_string());
            }
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

fn render_domain(
    pattern: &crate::compiler::CompiledPattern,
    opts: &GenerateOptions<'_>,
    consumed: &mut Vec<String>,
) -> Result<String, RouterError> {
    let mut out = String::new();
    for (i, segment) in pattern.segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match segment {
            Segment::Static(lit) => out.push_str(lit),
            Segment::Dynamic {
                name, alias, prefix, suffix, ..
            } => {
                let key = alias.as_deref().unwrap_or(name);
                let value = opts
                    .params
                    .get(key)
                    .cloned()
                    .ok_or_else(|| RouterError::MissingParam(key.to_string()))?;
                out.push_str(prefix);
                out.push_str(&value);
                out.push_str(suffix);
                consumed.push(key.to_string());
            }
        }
    }
    Ok(out)
}

fn route_rule<'a>(route: &'a CompiledRoute, name: &str) -> Option<&'a str> {
    route.rules.get(name).map(String::as_str)
}

fn encode(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC).to_string()
}
