/// Pattern parsing for page directory names
///
/// Pure functional parsing of page-tree directory names into typed segments.

use std::fmt;

/// One segment of a route pattern
///
/// # Examples
///
/// ```
/// use folio_router::route::pattern::{classify_segment, PatternSegment};
///
/// assert_eq!(classify_segment("about"), Ok(PatternSegment::Static("about".into())));
/// assert_eq!(classify_segment("[slug]"), Ok(PatternSegment::Param("slug".into())));
/// assert!(classify_segment("[]").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternSegment {
    /// Literal directory name, matched by equality
    Static(String),
    /// `[name]` directory, captures exactly one path segment
    Param(String),
}

impl PatternSegment {
    pub fn is_param(&self) -> bool {
        matches!(self, PatternSegment::Param(_))
    }
}

impl fmt::Display for PatternSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSegment::Static(name) => f.write_str(name),
            PatternSegment::Param(name) => write!(f, ":{}", name),
        }
    }
}

/// Classifies a directory name into a pattern segment (pure function)
///
/// # Parsing Rules
///
/// 1. **Param**: `[name]` where `name` is ASCII alphanumeric, `_` or `-`
/// 2. **Static**: any name without brackets
///
/// Anything else that uses brackets (`[]`, `[a b]`, `x[id]`) is rejected
/// with a reason string; the caller attaches the template it came from.
pub fn classify_segment(segment: &str) -> Result<PatternSegment, &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }

    match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some("") => Err("parameter name is empty"),
        Some(name) if is_param_name(name) => Ok(PatternSegment::Param(name.to_string())),
        Some(_) => Err("parameter names may only use letters, digits, `_` and `-`"),
        None if segment.contains(['[', ']']) => Err("brackets must wrap the whole segment"),
        None => Ok(PatternSegment::Static(segment.to_string())),
    }
}

fn is_param_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
