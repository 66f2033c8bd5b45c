// src/load/source.rs

use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Where a staging table's raw objects live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Object storage or HTTP, read by the warehouse itself.
    Remote { uri: String, scheme: String },
    /// A file, directory or glob on the local filesystem.
    Local { pattern: String },
}

impl SourceLocation {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "file" => {
                let pattern = url
                    .to_file_path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| url.path().to_string());
                SourceLocation::Local { pattern }
            }
            // A single-letter scheme is a Windows drive, not a URL.
            Ok(url) if url.scheme().len() > 1 => SourceLocation::Remote {
                uri: raw.to_string(),
                scheme: url.scheme().to_string(),
            },
            _ => SourceLocation::Local {
                pattern: raw.to_string(),
            },
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Remote { .. })
    }

    pub fn is_s3(&self) -> bool {
        matches!(self, SourceLocation::Remote { scheme, .. } if scheme == "s3")
    }

    /// Glob the warehouse should read for a remote prefix: a key prefix without
    /// wildcards covers every `.json` object below it.
    pub fn remote_pattern(uri: &str) -> String {
        if has_wildcard(uri) || uri.to_lowercase().ends_with(".json") {
            uri.to_string()
        } else {
            format!("{}/**/*.json", uri.trim_end_matches('/'))
        }
    }

    /// Glob pattern for a local location; directories expand to every `.json` below them.
    pub fn local_pattern(pattern: &str) -> String {
        if !has_wildcard(pattern) && Path::new(pattern).is_dir() {
            format!("{}/**/*.json", pattern.trim_end_matches('/'))
        } else {
            pattern.to_string()
        }
    }

    /// What the warehouse is asked to read: the remote glob, or every matching local
    /// file in sorted order. An empty list means the location is unreachable.
    pub fn resolve(&self) -> Vec<String> {
        match self {
            SourceLocation::Remote { uri, .. } => vec![Self::remote_pattern(uri)],
            SourceLocation::Local { pattern } => {
                let pattern = Self::local_pattern(pattern);
                let mut files: Vec<PathBuf> = match glob(&pattern) {
                    Ok(paths) => paths
                        .filter_map(|entry| match entry {
                            Ok(p) => Some(p),
                            Err(e) => {
                                warn!("cannot read glob entry: {:?}", e);
                                None
                            }
                        })
                        .filter(|p| p.is_file())
                        .collect(),
                    Err(e) => {
                        warn!(%pattern, "invalid glob pattern: {}", e);
                        Vec::new()
                    }
                };
                files.sort();
                debug!(%pattern, files = files.len(), "resolved local source");
                files
                    .into_iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect()
            }
        }
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?', '['])
}
