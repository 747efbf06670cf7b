//! Path normalization and the inclusion rules applied to every source path.
//!
//! Everything here is lexical: no function touches the filesystem. Paths are
//! compared in a separator-independent `/` form so that exclusion lists built
//! from glob results match declared sources however they were spelled.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A path in canonical `/`-separated form with `.` and `..` resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// True if `self` equals `ancestor` or lies below it, compared by whole
    /// components (`/tmp/ab` is not within `/tmp/a`).
    pub fn is_within(&self, ancestor: &NormalizedPath) -> bool {
        if self.0 == ancestor.0 {
            return true;
        }
        if ancestor.0 == "/" {
            return self.is_absolute();
        }
        if ancestor.0 == "." {
            return !self.is_absolute() && self.0 != ".." && !self.0.starts_with("../");
        }
        self.0
            .strip_prefix(ancestor.0.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// Lexically normalize a path.
///
/// Backslashes are treated as separators, empty and `.` segments vanish and
/// `..` pops the previous segment. A leading `..` survives on relative paths
/// and is dropped at the root of absolute ones. The empty path becomes `.`.
pub fn normalize(path: impl AsRef<Path>) -> NormalizedPath {
    let raw = path.as_ref().to_string_lossy().replace('\\', "/");
    let absolute = raw.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    let normalized = if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    };
    NormalizedPath(normalized)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn absolutize(path: impl AsRef<Path>, base: &Path) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path).as_path().to_path_buf()
    } else {
        normalize(base.join(path)).as_path().to_path_buf()
    }
}

/// Join a destination directory and a declared source path into the path the
/// file will have once the package is installed.
///
/// The declared source is joined as written, so a working directory used to
/// locate the file never leaks into the installed path.
pub fn join_installed(destination: &str, declared_source: &str) -> String {
    normalize(format!("{destination}/{declared_source}")).into_string()
}

/// Normalized source paths that must never be staged.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    paths: HashSet<NormalizedPath>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            paths: paths.into_iter().map(normalize).collect(),
        }
    }

    pub fn contains(&self, path: &NormalizedPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// True iff the normalized form of `path` is in `exclusions`.
pub fn is_excluded(path: impl AsRef<Path>, exclusions: &ExclusionSet) -> bool {
    exclusions.contains(&normalize(path))
}

/// True iff `path` lies at or below the current run's temp root.
///
/// Both paths are expected to be absolute; relative ones are compared as-is.
pub fn is_self_referential(path: impl AsRef<Path>, temp_root: &Path) -> bool {
    normalize(path).is_within(&normalize(temp_root))
}
