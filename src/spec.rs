//! Spec document rendering.
//!
//! Output is byte-for-byte deterministic for a given metadata snapshot and
//! manifest: lines joined with `\n`, sections separated by one blank line,
//! no trailing newline.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::buildroot::BuildRootLayout;
use crate::error::{Error, Result};
use crate::metadata::MergedMetadata;
use crate::plan::StagingManifest;

/// Render the spec document for `metadata` and `manifest`.
///
/// `top_dir` becomes the `_topdir` macro and should be absolute.
pub fn render(metadata: &MergedMetadata, top_dir: &Path, manifest: &StagingManifest) -> String {
    let mut b: Vec<String> = Vec::new();

    b.push(format!("%define _topdir {}", top_dir.display()));
    b.push("%define _binaries_in_noarch_packages_terminate_build   0".to_string());
    b.push(String::new());

    b.push(format!("Name: {}", metadata.name));
    b.push(format!("Version: {}", metadata.version));
    b.push(format!("Release: {}", metadata.release));
    b.push(format!("Summary: {}", metadata.summary));
    b.push(format!("License: {}", metadata.license));
    b.push(format!("BuildArch: {}", metadata.build_arch));
    b.push(format!("Group: {}", metadata.group));
    if !metadata.requires.is_empty() {
        b.push(format!("Requires: {}", metadata.requires));
    }
    b.push(String::new());

    b.push("%description".to_string());
    b.push(metadata.description.clone());
    b.push(String::new());

    b.push("%files".to_string());
    b.extend(manifest.installed_paths().map(|path| format!("\"{path}\"")));

    let scripts = [
        ("%pre", &metadata.pre_install),
        ("%post", &metadata.post_install),
        ("%preun", &metadata.pre_uninstall),
        ("%postun", &metadata.post_uninstall),
    ];
    for (section, lines) in scripts {
        b.push(String::new());
        b.push(section.to_string());
        b.extend(lines.iter().cloned());
    }

    b.join("\n")
}

/// Render and write the spec to `SPECS/<name>-<version>-<arch>.spec`.
pub fn write_spec(
    layout: &BuildRootLayout,
    metadata: &MergedMetadata,
    manifest: &StagingManifest,
) -> Result<PathBuf> {
    let path = layout.specs_dir().join(metadata.spec_file_name());
    info!("Generating RPM spec file {}", path.display());

    let content = render(metadata, layout.root(), manifest);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::fs("create directory", parent, e))?;
    }
    fs::write(&path, content).map_err(|e| Error::fs("write", &path, e))?;
    Ok(path)
}
