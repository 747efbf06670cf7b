//! Glob expansion of declared source and exclusion patterns.
//!
//! Patterns are matched below a root directory (an entry's working directory,
//! or the base directory of the run) and results are reported relative to
//! that root, exactly as a caller would have written them by hand. A pattern
//! prefixed with `!` removes earlier matches instead of adding new ones.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::path_policy::{normalize, ExclusionSet, NormalizedPath};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Expand `patterns` below `root`, keeping pattern order and dropping duplicates.
pub fn expand_sources(patterns: &[String], root: &Path) -> Result<Vec<String>> {
    let mut matched: Vec<String> = Vec::new();
    let mut seen: HashSet<NormalizedPath> = HashSet::new();

    for pattern in patterns {
        if let Some(negated) = pattern.strip_prefix('!') {
            let filter = Pattern::new(negated)
                .map_err(|e| Error::config(format!("invalid glob pattern '{pattern}': {e}")))?;
            matched.retain(|path| {
                let keep = !filter.matches_with(normalize(path).as_str(), MATCH_OPTIONS);
                if !keep {
                    seen.remove(&normalize(path));
                }
                keep
            });
            continue;
        }

        let found = glob_below(pattern, root)?;
        if found.is_empty() {
            warn!(pattern = %pattern, root = %root.display(), "pattern matched no files");
        }
        for path in found {
            if seen.insert(normalize(&path)) {
                matched.push(path);
            }
        }
    }

    Ok(matched)
}

/// Expand exclusion patterns against `base` into a normalized lookup set.
pub fn expand_exclusions(patterns: &[String], base: &Path) -> Result<ExclusionSet> {
    let paths = expand_sources(patterns, base)?;
    debug!(count = paths.len(), "resolved excluded paths");
    Ok(ExclusionSet::from_paths(paths))
}

fn glob_below(pattern: &str, root: &Path) -> Result<Vec<String>> {
    let absolute = Path::new(pattern).is_absolute();
    let full_pattern = if absolute {
        pattern.to_string()
    } else {
        let escaped_root = Pattern::escape(&root.to_string_lossy());
        format!("{}/{}", escaped_root.trim_end_matches('/'), pattern)
    };

    let entries = glob::glob_with(&full_pattern, MATCH_OPTIONS)
        .map_err(|e| Error::config(format!("invalid glob pattern '{pattern}': {e}")))?;

    let mut found = Vec::new();
    for entry in entries {
        let path: PathBuf = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            Error::fs("read", path, io::Error::from(e))
        })?;
        let reported = if absolute {
            path
        } else {
            path.strip_prefix(root).map(Path::to_path_buf).unwrap_or(path)
        };
        found.push(reported.to_string_lossy().into_owned());
    }
    Ok(found)
}
