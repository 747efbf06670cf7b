//! rpmbuild invocation and artifact relocation.
//!
//! Thin orchestration around the external packaging tool: no retries, and
//! any failure ends the run.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::buildroot::BuildRootLayout;
use crate::error::{Error, Result};
use crate::metadata::PackageMetadata;
use crate::process::{Cmd, CommandResult};

/// Environment variable naming the packaging tool to run.
pub const TOOL_ENV: &str = "RPMSTAGE_RPMBUILD";

/// Tool looked up on `PATH` when nothing else is configured.
pub const DEFAULT_TOOL: &str = "rpmbuild";

/// Find the packaging tool.
///
/// Resolution order: explicit override, `RPMSTAGE_RPMBUILD`, `rpmbuild` on `PATH`.
pub fn resolve_tool(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env::var_os(TOOL_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    which::which(DEFAULT_TOOL).map_err(|_| Error::PackagingTool {
        tool: DEFAULT_TOOL.to_string(),
        message: format!(
            "not found in PATH.\n\
             Solutions:\n\
             - Install rpm-build (dnf install rpm-build / apt install rpm)\n\
             - Set {TOOL_ENV}=/path/to/rpmbuild"
        ),
    })
}

/// Run `<tool> -bb --buildroot <BUILDROOT> <spec>`.
pub fn invoke(tool: &Path, layout: &BuildRootLayout, spec_path: &Path) -> Result<CommandResult> {
    info!("Building RPM package");
    let result = Cmd::new(tool)
        .arg("-bb")
        .arg("--buildroot")
        .arg_path(&layout.build_root())
        .arg_path(spec_path)
        .dir(layout.root())
        .run()?;
    debug!("Done: {}", result.stdout.trim());
    Ok(result)
}

/// Copy the produced package from `RPMS/<arch>/` into `output_dir`.
pub fn relocate(
    layout: &BuildRootLayout,
    metadata: &PackageMetadata,
    output_dir: &Path,
) -> Result<PathBuf> {
    let file_name = metadata.rpm_file_name();
    let produced = layout.rpms_dir(&metadata.build_arch).join(&file_name);
    let target = output_dir.join(&file_name);

    if !produced.is_file() {
        return Err(Error::ArtifactRelocation {
            path: produced,
            source: io::Error::new(
                io::ErrorKind::NotFound,
                "packaging tool reported success but the package is missing",
            ),
        });
    }

    fs::create_dir_all(output_dir).map_err(|e| Error::fs("create directory", output_dir, e))?;
    info!(
        "Copy output RPM package to {}: {}",
        output_dir.display(),
        produced.display()
    );
    fs::copy(&produced, &target).map_err(|source| Error::ArtifactRelocation {
        path: produced.clone(),
        source,
    })?;
    Ok(target)
}

/// Remove the temp root unless the caller asked to keep it.
pub fn cleanup(layout: &BuildRootLayout, keep_temp: bool) -> Result<()> {
    if keep_temp {
        info!("Keeping temp dir {}", layout.root().display());
        return Ok(());
    }
    info!("Deleting temp dir {}", layout.root().display());
    fs::remove_dir_all(layout.root()).map_err(|e| Error::fs("remove", layout.root(), e))
}
