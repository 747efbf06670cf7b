//! Build-root materialization.
//!
//! The temp root is owned by a single run and is wiped and recreated from
//! scratch every time, so nothing staged by an earlier run can end up in the
//! package. A failed copy aborts the whole operation; the half-built tree is
//! left on disk and must not be handed to the packaging tool.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::plan::{staged_path, StagingManifest};

/// Subdirectories rpmbuild expects below `_topdir`.
pub const LAYOUT_DIRS: [&str; 6] = ["BUILD", "BUILDROOT", "RPMS", "SOURCES", "SPECS", "SRPMS"];

/// The temp root and its canonical rpmbuild subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRootLayout {
    root: PathBuf,
}

impl BuildRootLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/BUILDROOT`, mirroring the installed filesystem.
    pub fn build_root(&self) -> PathBuf {
        self.root.join("BUILDROOT")
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.root.join("SPECS")
    }

    /// Directory rpmbuild writes binary packages for `arch` into.
    pub fn rpms_dir(&self, arch: &str) -> PathBuf {
        self.root.join("RPMS").join(arch)
    }

    /// Delete the temp root if present, then create it with every layout directory.
    pub fn recreate(&self) -> Result<()> {
        if self.root.exists() {
            info!("Deleting old temp dir {}", self.root.display());
            fs::remove_dir_all(&self.root).map_err(|e| Error::fs("remove", &self.root, e))?;
        }

        info!("Creating RPM folder structure at {}", self.root.display());
        for dir in LAYOUT_DIRS {
            let path = self.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| Error::fs("create directory", &path, e))?;
        }
        Ok(())
    }
}

/// Recreate the layout and copy every manifest file under `BUILDROOT`.
pub fn materialize(layout: &BuildRootLayout, manifest: &StagingManifest) -> Result<()> {
    layout.recreate()?;

    let build_root = layout.build_root();
    info!("Copying files to build root {}", build_root.display());
    for file in manifest.files() {
        let target = staged_path(&build_root, file);
        info!("Copying: {}", file.source.display());
        copy_file(&file.source, &target)?;
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::fs("create directory", parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| Error::fs("copy", src, e))?;
    Ok(())
}

/// Check that `BUILDROOT` holds exactly the manifest's files, each
/// byte-identical to its source.
pub fn verify(layout: &BuildRootLayout, manifest: &StagingManifest) -> Result<()> {
    let build_root = layout.build_root();
    let staged = snapshot(&build_root)?;

    let mut expected = BTreeSet::new();
    for file in manifest.files() {
        let rel = file.installed_path.trim_start_matches('/');
        let matches = match staged.get(rel) {
            Some(digest) => *digest == sha256_file(&file.source)?,
            None => false,
        };
        if !matches {
            return Err(Error::Verification {
                path: staged_path(&build_root, file),
            });
        }
        expected.insert(rel);
    }

    if let Some(stray) = staged.keys().find(|rel| !expected.contains(rel.as_str())) {
        return Err(Error::Verification {
            path: build_root.join(stray),
        });
    }
    Ok(())
}

/// Map of every regular file below `dir` (relative, `/`-separated) to its sha256.
pub fn snapshot(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            Error::fs("walk", path, io::Error::from(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.insert(rel, sha256_file(entry.path())?);
    }
    Ok(files)
}

pub(crate) fn sha256_file(path: &Path) -> Result<String> {
    let f = File::open(path).map_err(|e| Error::fs("open", path, e))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf).map_err(|e| Error::fs("read", path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
