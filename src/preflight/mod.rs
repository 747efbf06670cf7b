//! Preflight checks for packaging runs.
//!
//! Validates that the host system has the required tools before staging
//! anything, so a missing rpmbuild is reported up front instead of after the
//! build root has been populated.
//!
//! # Example
//!
//! ```rust
//! use rpmstage::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("rpmbuild") {
//!     println!("rpm-build not installed");
//! }
//!
//! let tools = &[("rpmbuild", "rpm-build")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use std::path::Path;

use crate::error::{Error, Result};
use crate::process::Cmd;

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Required host tools for building packages.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("rpmbuild", "rpm-build")];

/// Check that specific tools are available.
///
/// Returns a configuration error listing every missing tool and the package
/// that provides it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(Error::config(format!("Missing required host tools:\n{}", msg)));
    }

    Ok(())
}

/// Check all tools in [`REQUIRED_TOOLS`].
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}

/// First line of `<tool> --version`, if the tool answers.
pub fn tool_version(tool: &Path) -> Option<String> {
    let result = Cmd::new(tool).arg("--version").allow_fail().run().ok()?;
    if !result.success() {
        return None;
    }
    result
        .stdout
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}
