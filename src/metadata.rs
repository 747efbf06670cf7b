//! Package metadata and the merged snapshot the spec renderer consumes.

use std::ops::Deref;

/// Declarative description of the package being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub release: String,
    pub summary: String,
    pub description: String,
    pub license: String,
    /// Accepted for completeness; the rendered header does not carry it.
    pub vendor: String,
    pub group: String,
    pub build_arch: String,
    /// Dependency string; omitted from the header when empty.
    pub requires: String,
    pub pre_install: Vec<String>,
    pub post_install: Vec<String>,
    pub pre_uninstall: Vec<String>,
    pub post_uninstall: Vec<String>,
}

impl Default for PackageMetadata {
    fn default() -> Self {
        Self {
            name: "noname".to_string(),
            version: "0.1.0".to_string(),
            release: "1".to_string(),
            summary: "No Summary".to_string(),
            description: "No Description".to_string(),
            license: "MIT".to_string(),
            vendor: "Vendor".to_string(),
            group: "Development/Tools".to_string(),
            build_arch: "noarch".to_string(),
            requires: String::new(),
            pre_install: Vec::new(),
            post_install: Vec::new(),
            pre_uninstall: Vec::new(),
            post_uninstall: Vec::new(),
        }
    }
}

impl PackageMetadata {
    /// `<name>-<version>-<arch>.spec`, the file written under `SPECS/`.
    pub fn spec_file_name(&self) -> String {
        format!("{}-{}-{}.spec", self.name, self.version, self.build_arch)
    }

    /// `<name>-<version>-<release>.<arch>.rpm`, the artifact rpmbuild produces.
    pub fn rpm_file_name(&self) -> String {
        format!(
            "{}-{}-{}.{}.rpm",
            self.name, self.version, self.release, self.build_arch
        )
    }
}

/// Metadata with the attribute-derived post-install lines appended.
///
/// Only [`crate::plan::StagingPlan::merge`] builds one, so a spec can never be
/// rendered from script lines that are missing the planner's contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedMetadata {
    inner: PackageMetadata,
}

impl MergedMetadata {
    pub(crate) fn new(metadata: &PackageMetadata, attribute_script: &[String]) -> Self {
        let mut inner = metadata.clone();
        inner.post_install.extend(attribute_script.iter().cloned());
        Self { inner }
    }
}

impl Deref for MergedMetadata {
    type Target = PackageMetadata;

    fn deref(&self) -> &PackageMetadata {
        &self.inner
    }
}
