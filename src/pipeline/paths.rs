use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::path_policy::{absolutize, normalize};

/// Prefix of every generated temp directory name.
pub const TEMP_DIR_PREFIX: &str = "rpmstage-tmp-";

/// A fresh `rpmstage-tmp-<suffix>` name, unique per call.
pub fn default_temp_dir_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{TEMP_DIR_PREFIX}{}", &suffix[..12])
}

/// The temp root for a run: the pinned directory if any, else a fresh name
/// below `base_dir`. Relative pins resolve against `base_dir`.
pub fn resolve_temp_root(base_dir: &Path, pinned: Option<&Path>) -> PathBuf {
    match pinned {
        Some(dir) => absolutize(dir, base_dir),
        None => absolutize(default_temp_dir_name(), base_dir),
    }
}

/// Reject a temp root that is the base directory or one of its ancestors.
///
/// The temp root is wiped before staging, so such a root would take the
/// project's sources and config with it.
pub fn check_temp_root(base_dir: &Path, temp_root: &Path) -> Result<()> {
    let base = normalize(base_dir);
    let root = normalize(temp_root);
    if base.is_within(&root) {
        return Err(Error::config(format!(
            "temp dir '{root}' contains the project directory '{base}'; \
             pick a directory below it or outside it"
        )));
    }
    Ok(())
}
