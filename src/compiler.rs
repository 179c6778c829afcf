//! Compiles parsed [`Segment`](crate::segment::Segment) sequences into
//! anchored regular expressions, per `SPEC_FULL.md` §4.2.
//!
//! A [`CompiledPattern`] is produced once per alias of a route's `path`, and
//! once more for its `domain` if present. Compilation is deterministic and
//! the result is cheap to clone (an `Arc`-free `Regex` clone is itself an
//! `Arc` internally in the `regex` crate).

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::definition::Rules;
use crate::error::RouterError;
use crate::segment::{self, Quantifier, Segment};

/// One compiled alternative of a path or domain pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The original pattern string, for diagnostics and URL generation.
    pub source: String,
    /// The parsed segment sequence, used by the URL generator to walk the
    /// pattern and substitute values.
    pub segments: Vec<Segment>,
    /// The anchored regex used at match time.
    pub regex: Regex,
    /// Sanitized-group-name → original binding key, since regex capture
    /// group names must be valid identifiers but binding keys need not be.
    pub group_names: HashMap<String, String>,
}

impl CompiledPattern {
    /// The set of binding keys this pattern captures, in declaration order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(Segment::binding_key)
            .collect()
    }
}

/// Produces a valid regex capture-group name for a binding key that may
/// contain characters the `regex` crate doesn't allow in group names.
fn sanitize_group_name(key: &str, index: usize) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("p{index}_{cleaned}")
}

fn default_rule(quantifier: Quantifier) -> &'static str {
    match quantifier {
        Quantifier::OneOrMore => ".+",
        Quantifier::ZeroOrMore => ".*",
        Quantifier::One | Quantifier::Optional => "[^/]+",
    }
}

fn segment_regex(
    seg: &Segment,
    rules: &Rules,
    index: &mut usize,
    group_names: &mut HashMap<String, String>,
) -> String {
    match seg {
        Segment::Static(lit) => regex::escape(lit),
        Segment::Dynamic {
            name,
            alias,
            quantifier,
            prefix,
            suffix,
        } => {
            let key = alias.clone().unwrap_or_else(|| name.clone());
            let group = sanitize_group_name(&key, *index);
            *index += 1;
            group_names.insert(group.clone(), key);
            let rule = rules
                .get(name)
                .map(String::as_str)
                .unwrap_or_else(|| default_rule(*quantifier));
            format!(
                "{}(?P<{}>{}){}",
                regex::escape(prefix),
                group,
                rule,
                regex::escape(suffix)
            )
        }
    }
}

/// Builds the regex body (the part between `^` and the trailing-slash
/// tolerance) for a sequence of segments, wrapping each optional-and-after
/// run of segments in a non-capturing optional group.
fn build_body(
    segments: &[Segment],
    rules: &Rules,
    index: &mut usize,
    group_names: &mut HashMap<String, String>,
) -> String {
    match segments.split_first() {
        None => String::new(),
        Some((seg, rest)) => {
            let seg_re = segment_regex(seg, rules, index, group_names);
            let rest_re = build_body(rest, rules, index, group_names);
            let is_optional = matches!(
                seg,
                Segment::Dynamic { quantifier, .. } if quantifier.allows_absence()
            );
            if is_optional {
                format!("(?:/{seg_re}{rest_re})?")
            } else {
                format!("/{seg_re}{rest_re}")
            }
        }
    }
}

/// Compiles a single pattern string (one path alias, or a domain) into a
/// [`CompiledPattern`].
///
/// `strict` only applies to path patterns; pass `true` for domain patterns
/// (hosts have no meaningful "trailing slash").
pub fn compile(pattern: &str, rules: &Rules, strict: bool) -> Result<CompiledPattern, RouterError> {
    let segments = segment::parse(pattern)?;
    let mut index = 0usize;
    let mut group_names = HashMap::new();

    let mut seen = HashSet::new();
    for seg in &segments {
        if let Some(key) = seg.binding_key() {
            if !seen.insert(key.to_string()) {
                return Err(RouterError::Definition(format!(
                    "duplicate parameter name `{key}` in pattern `{pattern}`"
                )));
            }
        }
    }

    let body = if segments.is_empty() {
        "/".to_string()
    } else {
        build_body(&segments, rules, &mut index, &mut group_names)
    };

    let full = if strict {
        format!("^{body}$")
    } else {
        format!("^{body}/?$")
    };

    let regex = Regex::new(&full)
        .map_err(|e| RouterError::Definition(format!("invalid compiled pattern `{pattern}`: {e}")))?;

    Ok(CompiledPattern {
        source: pattern.to_string(),
        segments,
        regex,
        group_names,
    })
}

/// Compiles every alias of a `path` field into one [`CompiledPattern`] each.
pub fn compile_all(
    aliases: &[&str],
    rules: &Rules,
    strict: bool,
) -> Result<Vec<CompiledPattern>, RouterError> {
    aliases.iter().map(|a| compile(a, rules, strict)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_simple_dynamic_path() {
        let rules = Rules::new();
        let compiled = compile("/users/:id", &rules, true).unwrap();
        let caps = compiled.regex.captures("/users/42").unwrap();
        let group = compiled
            .group_names
            .iter()
            .find(|(_, orig)| orig.as_str() == "id")
            .unwrap()
            .0;
        assert_eq!(&caps[group.as_str()], "42");
        assert!(!compiled.regex.is_match("/users/42/"));
    }

    #[test]
    fn non_strict_allows_trailing_slash() {
        let rules = Rules::new();
        let compiled = compile("/users", &rules, false).unwrap();
        assert!(compiled.regex.is_match("/users"));
        assert!(compiled.regex.is_match("/users/"));
    }

    #[test]
    fn strict_rejects_trailing_slash() {
        let rules = Rules::new();
        let compiled = compile("/users", &rules, true).unwrap();
        assert!(compiled.regex.is_match("/users"));
        assert!(!compiled.regex.is_match("/users/"));
    }

    #[test]
    fn applies_custom_rule() {
        let mut rules = Rules::new();
        rules.insert("id".to_string(), r"\d+".to_string());
        let compiled = compile("/users/:id", &rules, true).unwrap();
        assert!(compiled.regex.is_match("/users/42"));
        assert!(!compiled.regex.is_match("/users/abc"));
    }

    #[test]
    fn optional_trailing_segment() {
        let rules = Rules::new();
        let compiled = compile("/archive/:year?", &rules, true).unwrap();
        assert!(compiled.regex.is_match("/archive"));
        assert!(compiled.regex.is_match("/archive/2024"));
    }

    #[test]
    fn root_path_matches() {
        let rules = Rules::new();
        let compiled = compile("/", &rules, true).unwrap();
        assert!(compiled.regex.is_match("/"));
        assert!(!compiled.regex.is_match(""));
    }

    #[test]
    fn prefix_and_suffix_literal_text() {
        let rules = Rules::new();
        let compiled = compile("/v{version}", &rules, true).unwrap();
        assert!(compiled.regex.is_match("/v3"));
        assert!(!compiled.regex.is_match("/3"));
    }

    #[test]
    fn rejects_duplicate_param_names() {
        let rules = Rules::new();
        assert!(compile("/:id/:id", &rules, true).is_err());
    }
}
