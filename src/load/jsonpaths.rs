// src/load/jsonpaths.rs
//! JSONPaths documents: `{"jsonpaths": ["$['artist']", "$.auth", ...]}`, one path per
//! staging column, matched by position.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One step of a path below the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// `.ident`, `['key']`, `["key"]` or `[n]`, anchored at the start of the remaining input.
static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:\.([A-Za-z_][A-Za-z0-9_]*)|\['((?:[^'\\]|\\.)*)'\]|\["((?:[^"\\]|\\.)*)"\]|\[(\d+)\])"#,
    )
    .unwrap_or_else(|e| unreachable!("segment pattern: {e}"))
});

static ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(.)").unwrap_or_else(|e| unreachable!("escape pattern: {e}")));

static IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|e| unreachable!("ident pattern: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let rest = raw
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| format!("`{raw}` does not start at the root `$`"))?;

        let mut segments = Vec::new();
        let mut rest = rest;
        while !rest.is_empty() {
            let caps = SEGMENT
                .captures(rest)
                .ok_or_else(|| format!("`{raw}` has an unreadable segment at `{rest}`"))?;
            let segment = if let Some(m) = caps.get(1) {
                PathSegment::Key(m.as_str().to_string())
            } else if let Some(m) = caps.get(2).or_else(|| caps.get(3)) {
                PathSegment::Key(ESCAPE.replace_all(m.as_str(), "$1").into_owned())
            } else if let Some(m) = caps.get(4) {
                let idx = m
                    .as_str()
                    .parse()
                    .map_err(|e| format!("`{raw}` has a bad index: {e}"))?;
                PathSegment::Index(idx)
            } else {
                return Err(format!("`{raw}` has an empty segment"));
            };
            segments.push(segment);
            rest = &rest[caps.get(0).map_or(0, |m| m.end())..];
        }

        if segments.is_empty() {
            return Err(format!("`{raw}` selects the whole record"));
        }
        Ok(Self { segments })
    }

    /// Top-level `key` of the record.
    pub fn key(name: &str) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.to_string())],
        }
    }

    /// Render in the JSON path syntax DuckDB's `json_extract` family accepts.
    pub fn to_duckdb(&self) -> String {
        let mut out = String::from("$");
        for seg in &self.segments {
            match seg {
                PathSegment::Key(k) if IDENT.is_match(k) => {
                    out.push('.');
                    out.push_str(k);
                }
                PathSegment::Key(k) => {
                    out.push_str(".\"");
                    out.push_str(&k.replace('"', "\\\""));
                    out.push('"');
                }
                PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }

    /// Render in bracket notation, the form Redshift documents use.
    pub fn to_bracket(&self) -> String {
        let mut out = String::from("$");
        for seg in &self.segments {
            match seg {
                PathSegment::Key(k) => out.push_str(&format!("['{}']", k.replace('\'', "\\'"))),
                PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }
}

#[derive(Serialize, Deserialize)]
struct JsonPathsDoc {
    jsonpaths: Vec<String>,
}

/// Ordered list of paths; path `i` fills staging column `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPathSpec {
    pub paths: Vec<FieldPath>,
}

/// Keys of one listening-log line, in `staging_events` column order.
const EVENT_LOG_KEYS: [&str; 18] = [
    "artist",
    "auth",
    "firstName",
    "gender",
    "itemInSession",
    "lastName",
    "length",
    "level",
    "location",
    "method",
    "page",
    "registration",
    "sessionId",
    "song",
    "status",
    "ts",
    "userAgent",
    "userId",
];

impl FieldPathSpec {
    pub fn from_json(text: &str) -> Result<Self, String> {
        let doc: JsonPathsDoc =
            serde_json::from_str(text).map_err(|e| format!("not a JSONPaths document: {e}"))?;
        let paths = doc
            .jsonpaths
            .iter()
            .map(|p| FieldPath::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { paths })
    }

    /// Column names read straight off the record, the "auto" mapping.
    pub fn auto<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            paths: columns.into_iter().map(FieldPath::key).collect(),
        }
    }

    /// Mapping for the listening log's camelCase keys.
    pub fn event_log() -> Self {
        Self::auto(EVENT_LOG_KEYS)
    }

    pub fn to_json(&self) -> String {
        let doc = JsonPathsDoc {
            jsonpaths: self.paths.iter().map(FieldPath::to_bracket).collect(),
        };
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
