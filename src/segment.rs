//! Parses a path or domain pattern string into a sequence of [`Segment`]s,
//! per the grammar in `SPEC_FULL.md` §4.2:
//!
//! ```text
//! path        := "/" ( segment "/" )* segment?
//! segment     := literal | dynamic | literal dynamic literal
//! dynamic     := ":" name quantifier?           ; lightweight form
//!              | "{" name ( ":" alias )? "}" quantifier?
//!              | "*" name                       ; catch-all glob, zero-or-more
//! quantifier  := "?" | "+" | "*"
//! ```

use crate::error::RouterError;

/// How many path components a dynamic segment may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Exactly one component, required.
    One,
    /// Exactly one component, may be absent (only legal in trailing
    /// position, followed only by other optional segments).
    Optional,
    /// One or more components, consuming the remainder of the path. Only
    /// legal as the last segment.
    OneOrMore,
    /// Zero or more components, consuming the remainder of the path. Only
    /// legal as the last segment.
    ZeroOrMore,
}

impl Quantifier {
    /// Whether this quantifier may span more than one path component
    /// (a glob/catch-all segment).
    pub fn is_multi(self) -> bool {
        matches!(self, Quantifier::OneOrMore | Quantifier::ZeroOrMore)
    }

    /// Whether a value is permitted to be entirely absent for this
    /// quantifier.
    pub fn allows_absence(self) -> bool {
        matches!(self, Quantifier::Optional | Quantifier::ZeroOrMore)
    }
}

/// One slash-delimited unit of a path or domain pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matched by exact string equality.
    Static(String),
    /// A named capture, with optional literal prefix/suffix text within the
    /// same path component (e.g. `v{version}` has a `"v"` prefix).
    Dynamic {
        /// The parameter name, used as the binding key unless `alias`
        /// overrides it.
        name: String,
        /// An alternate binding key declared via the `{name:alias}` form.
        alias: Option<String>,
        /// How many components this segment may consume.
        quantifier: Quantifier,
        /// Literal text preceding the capture within the same component.
        prefix: String,
        /// Literal text following the capture within the same component.
        suffix: String,
    },
}

impl Segment {
    /// The binding key for a dynamic segment (its alias if declared, else
    /// its name); `None` for static segments.
    pub fn binding_key(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Dynamic { name, alias, .. } => Some(alias.as_deref().unwrap_or(name)),
        }
    }

    /// The parameter name, for dynamic segments.
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Dynamic { name, .. } => Some(name),
        }
    }
}

/// Splits a pattern string into path components, dropping empty components
/// produced by leading/trailing/duplicate slashes.
fn components(pattern: &str) -> Vec<&str> {
    pattern.split('/').filter(|c| !c.is_empty()).collect()
}

/// Parses a full path (or domain) pattern into its segments.
pub fn parse(pattern: &str) -> Result<Vec<Segment>, RouterError> {
    let comps = components(pattern);
    let mut segments = Vec::with_capacity(comps.len());
    let mut seen_optional = false;
    let mut seen_multi = false;

    for (idx, comp) in comps.iter().enumerate() {
        if seen_multi {
            return Err(RouterError::Definition(format!(
                "segment `{comp}` follows a glob/multi-component segment, which must be last"
            )));
        }
        let segment = parse_component(comp)?;
        let is_last = idx + 1 == comps.len();

        if let Segment::Dynamic { quantifier, .. } = &segment {
            if quantifier.is_multi() && !is_last {
                return Err(RouterError::Definition(format!(
                    "segment `{comp}` uses a multi-component quantifier but is not last"
                )));
            }
            if quantifier.allows_absence() {
                seen_optional = true;
            } else if seen_optional {
                return Err(RouterError::Definition(format!(
                    "required segment `{comp}` follows an optional segment"
                )));
            }
            if quantifier.is_multi() {
                seen_multi = true;
            }
        } else if seen_optional {
            return Err(RouterError::Definition(format!(
                "static segment `{comp}` follows an optional segment"
            )));
        }

        segments.push(segment);
    }

    Ok(segments)
}

fn parse_component(comp: &str) -> Result<Segment, RouterError> {
    if let Some(open) = comp.find('{') {
        let close = comp[open..]
            .find('}')
            .map(|p| p + open)
            .ok_or_else(|| RouterError::Definition(format!("unterminated `{{` in `{comp}`")))?;
        let prefix = comp[..open].to_string();
        let inner = &comp[open + 1..close];
        let (rest, quantifier) = extract_quantifier(&comp[close + 1..]);
        let suffix = rest.to_string();
        let (name, alias) = split_name_alias(inner)?;
        Ok(Segment::Dynamic {
            name,
            alias,
            quantifier,
            prefix,
            suffix,
        })
    } else if let Some(name) = comp.strip_prefix('*') {
        if name.is_empty() {
            return Err(RouterError::Definition(format!(
                "empty parameter name in `{comp}`"
            )));
        }
        Ok(Segment::Dynamic {
            name: name.to_string(),
            alias: None,
            quantifier: Quantifier::ZeroOrMore,
            prefix: String::new(),
            suffix: String::new(),
        })
    } else if let Some(colon) = comp.find(':') {
        let prefix = comp[..colon].to_string();
        let rest = &comp[colon + 1..];
        let name_end = rest
            .find(|c: char| c == '?' || c == '+' || c == '*')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_string();
        if name.is_empty() {
            return Err(RouterError::Definition(format!(
                "empty parameter name in `{comp}`"
            )));
        }
        let (suffix, quantifier) = extract_quantifier(&rest[name_end..]);
        Ok(Segment::Dynamic {
            name,
            alias: None,
            quantifier,
            prefix,
            suffix: suffix.to_string(),
        })
    } else {
        Ok(Segment::Static(comp.to_string()))
    }
}

fn extract_quantifier(rest: &str) -> (&str, Quantifier) {
    match rest.chars().next() {
        Some('?') => (&rest[1..], Quantifier::Optional),
        Some('+') => (&rest[1..], Quantifier::OneOrMore),
        Some('*') => (&rest[1..], Quantifier::ZeroOrMore),
        _ => (rest, Quantifier::One),
    }
}

fn split_name_alias(inner: &str) -> Result<(String, Option<String>), RouterError> {
    match inner.split_once(':') {
        Some((name, alias)) if !name.is_empty() && !alias.is_empty() => {
            Ok((name.to_string(), Some(alias.to_string())))
        }
        Some(_) => Err(RouterError::Definition(format!(
            "malformed name:alias in `{{{inner}}}`"
        ))),
        None if !inner.is_empty() => Ok((inner.to_string(), None)),
        None => Err(RouterError::Definition("empty parameter name".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_static_segments() {
        let segs = parse("/users/all").unwrap();
        assert_eq!(segs.len(), 2);
        assert!(matches!(&segs[0], Segment::Static(s) if s == "users"));
        assert!(matches!(&segs[1], Segment::Static(s) if s == "all"));
    }

    #[test]
    fn parses_lightweight_dynamic() {
        let segs = parse("/users/:id").unwrap();
        match &segs[1] {
            Segment::Dynamic {
                name, quantifier, ..
            } => {
                assert_eq!(name, "id");
                assert_eq!(*quantifier, Quantifier::One);
            }
            _ => panic!("expected dynamic"),
        }
    }

    #[test]
    fn parses_brace_dynamic_with_alias_and_prefix() {
        let segs = parse("/v{version:ver}").unwrap();
        match &segs[0] {
            Segment::Dynamic {
                name, alias, prefix, ..
            } => {
                assert_eq!(name, "version");
                assert_eq!(alias.as_deref(), Some("ver"));
                assert_eq!(prefix, "v");
            }
            _ => panic!("expected dynamic"),
        }
    }

    #[test]
    fn parses_optional_quantifier() {
        let segs = parse("/archive/:year?").unwrap();
        match &segs[1] {
            Segment::Dynamic { quantifier, .. } => assert_eq!(*quantifier, Quantifier::Optional),
            _ => panic!("expected dynamic"),
        }
    }

    #[test]
    fn rejects_required_after_optional() {
        assert!(parse("/a/:b?/c").is_err());
    }

    #[test]
    fn rejects_segment_after_glob() {
        assert!(parse("/files/*rest/more").is_err());
    }

    #[test]
    fn parses_trailing_glob() {
        let segs = parse("/files/:rest*").unwrap();
        match &segs[1] {
            Segment::Dynamic { quantifier, .. } => {
                assert_eq!(*quantifier, Quantifier::ZeroOrMore)
            }
            _ => panic!("expected dynamic"),
        }
    }

    #[test]
    fn parses_leading_star_catch_all() {
        let segs = parse("/files/*rest").unwrap();
        match &segs[1] {
            Segment::Dynamic { name, quantifier, .. } => {
                assert_eq!(name, "rest");
                assert_eq!(*quantifier, Quantifier::ZeroOrMore);
            }
            _ => panic!("expected dynamic"),
        }
    }
}
