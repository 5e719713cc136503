//! Path template matching.
//!
//! # Responsibilities
//! - Parse templates such as `/v1/exercises/{id}`
//! - Match a request path segment by segment (case-sensitive)
//! - Capture variables raw; decode them only on access
//!
//! # Design Decisions
//! - A variable matches exactly one segment, so it may be empty but never
//!   contains `/`
//! - Decoding failures surface as [`PathError`] rather than a no-match

use std::fmt;

/// One segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Variable(&'static str),
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: &'static str,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template. Segments wrapped in braces are variables.
    pub fn new(source: &'static str) -> Self {
        let segments = source
            .trim_start_matches('/')
            .split('/')
            .map(|segment| {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => Segment::Variable(name),
                    None => Segment::Literal(segment),
                }
            })
            .collect();
        Self { source, segments }
    }

    pub fn as_str(&self) -> &'static str {
        self.source
    }

    /// Match `path` against the template, capturing variables.
    pub fn matches<'p>(&self, path: &'p str) -> Option<PathVars<'p>> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut vars = Vec::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Variable(name) => vars.push((*name, part)),
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(PathVars { vars })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source)
    }
}

/// Raw variables captured from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVars<'p> {
    vars: Vec<(&'static str, &'p str)>,
}

impl PathVars<'_> {
    /// Percent-decoded value of a required variable.
    pub fn required(&self, name: &str) -> Result<String, PathError> {
        let raw = self
            .vars
            .iter()
            .find(|(var, _)| *var == name)
            .map(|(_, raw)| *raw)
            .ok_or_else(|| PathError::Missing(name.to_string()))?;

        let value = percent_decode(raw).ok_or_else(|| PathError::Undecodable {
            name: name.to_string(),
            raw: raw.to_string(),
        })?;
        if value.is_empty() {
            return Err(PathError::Missing(name.to_string()));
        }
        Ok(value)
    }
}

/// A path variable that could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("missing required path parameter {0:?}")]
    Missing(String),

    #[error("path parameter {name:?} is not valid percent-encoded UTF-8: {raw:?}")]
    Undecodable { name: String, raw: String },
}

/// Decode `%XX` escapes. `+` is left as is.
fn percent_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            let hi = (hex[0] as char).to_digit(16)?;
            let lo = (hex[1] as char).to_digit(16)?;
            out.push((hi * 16 + lo) as u8);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
