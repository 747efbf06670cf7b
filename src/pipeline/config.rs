use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::metadata::PackageMetadata;
use crate::plan::FileMappingEntry;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "rpmstage.toml";

/// Everything a packaging run is configured with.
#[derive(Debug, Clone, Default)]
pub struct PackageConfig {
    pub metadata: PackageMetadata,
    pub files: Vec<FileMappingEntry>,
    pub exclude_files: Vec<String>,
    pub temp_dir: Option<PathBuf>,
    pub keep_temp: bool,
    pub rpmbuild: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RpmstageToml {
    temp_dir: Option<String>,
    keep_temp: Option<bool>,
    exclude_files: Option<OneOrMany>,
    rpmbuild: Option<String>,
    package: Option<PackageToml>,
    #[serde(default)]
    files: Vec<FileToml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageToml {
    name: Option<String>,
    version: Option<String>,
    release: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    license: Option<String>,
    vendor: Option<String>,
    group: Option<String>,
    build_arch: Option<String>,
    requires: Option<String>,
    pre_install_script: Option<OneOrMany>,
    post_install_script: Option<OneOrMany>,
    pre_uninstall_script: Option<OneOrMany>,
    post_uninstall_script: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileToml {
    source: Option<OneOrMany>,
    destination: Option<String>,
    working_dir: Option<String>,
    mode: Option<String>,
    owner: Option<String>,
    group: Option<String>,
}

/// A single string or a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Read and parse a config file.
pub fn load_config(path: &Path) -> Result<PackageConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::fs("read config", path, e))?;
    parse_config(&content)
        .map_err(|e| Error::config(format!("parsing config '{}': {}", path.display(), e)))
}

/// Parse config text, filling every unset package field with its default.
pub fn parse_config(content: &str) -> std::result::Result<PackageConfig, toml::de::Error> {
    let parsed: RpmstageToml = toml::from_str(content)?;
    let package = parsed.package.unwrap_or_default();
    let defaults = PackageMetadata::default();

    let metadata = PackageMetadata {
        name: package.name.unwrap_or(defaults.name),
        version: package.version.unwrap_or(defaults.version),
        release: package.release.unwrap_or(defaults.release),
        summary: package.summary.unwrap_or(defaults.summary),
        description: package.description.unwrap_or(defaults.description),
        license: package.license.unwrap_or(defaults.license),
        vendor: package.vendor.unwrap_or(defaults.vendor),
        group: package.group.unwrap_or(defaults.group),
        build_arch: package.build_arch.unwrap_or(defaults.build_arch),
        requires: package.requires.unwrap_or(defaults.requires),
        pre_install: lines(package.pre_install_script),
        post_install: lines(package.post_install_script),
        pre_uninstall: lines(package.pre_uninstall_script),
        post_uninstall: lines(package.post_uninstall_script),
    };

    let files = parsed
        .files
        .into_iter()
        .map(|file| FileMappingEntry {
            source: file.source.map(OneOrMany::into_vec),
            destination: file.destination,
            working_dir: file.working_dir.map(PathBuf::from),
            mode: file.mode,
            owner: file.owner,
            group: file.group,
        })
        .collect();

    Ok(PackageConfig {
        metadata,
        files,
        exclude_files: lines(parsed.exclude_files),
        temp_dir: parsed.temp_dir.map(PathBuf::from),
        keep_temp: parsed.keep_temp.unwrap_or(false),
        rpmbuild: parsed.rpmbuild.map(PathBuf::from),
    })
}

fn lines(value: Option<OneOrMany>) -> Vec<String> {
    value.map(OneOrMany::into_vec).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"
temp_dir = "build/rpm"
keep_temp = true
exclude_files = "dist/**/*.map"
rpmbuild = "/usr/local/bin/rpmbuild"

[package]
name = "pkg"
version = "1.0.0"
release = "3"
summary = "A package"
description = "Longer text"
build_arch = "x86_64"
requires = "lib-foo"
post_install_script = ["ldconfig"]
pre_uninstall_script = "systemctl stop pkg"

[[files]]
source = ["bin/*", "lib/*.so"]
destination = "/opt/pkg"
working_dir = "dist"
mode = "755"

[[files]]
source = "README.md"
destination = "/usr/share/doc/pkg"
owner = "root"
group = "root"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(FULL).unwrap();

        assert_eq!(config.metadata.name, "pkg");
        assert_eq!(config.metadata.release, "3");
        assert_eq!(config.metadata.build_arch, "x86_64");
        assert_eq!(config.metadata.requires, "lib-foo");
        assert_eq!(config.metadata.license, "MIT");
        assert_eq!(config.metadata.post_install, vec!["ldconfig"]);
        assert_eq!(config.metadata.pre_uninstall, vec!["systemctl stop pkg"]);
        assert!(config.metadata.pre_install.is_empty());

        assert_eq!(config.exclude_files, vec!["dist/**/*.map"]);
        assert_eq!(config.temp_dir, Some(PathBuf::from("build/rpm")));
        assert!(config.keep_temp);
        assert_eq!(config.rpmbuild, Some(PathBuf::from("/usr/local/bin/rpmbuild")));

        assert_eq!(config.files.len(), 2);
        assert_eq!(
            config.files[0].source,
            Some(vec!["bin/*".to_string(), "lib/*.so".to_string()])
        );
        assert_eq!(config.files[0].working_dir, Some(PathBuf::from("dist")));
        assert_eq!(config.files[0].mode.as_deref(), Some("755"));
        assert_eq!(config.files[1].source, Some(vec!["README.md".to_string()]));
        assert_eq!(config.files[1].owner.as_deref(), Some("root"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.metadata, PackageMetadata::default());
        assert!(config.files.is_empty());
        assert!(!config.keep_temp);
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn test_missing_destination_survives_parsing() {
        // Reported by the planner, not by the parser.
        let config = parse_config("[[files]]\nsource = \"a.txt\"\n").unwrap();
        assert!(config.files[0].destination.is_none());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse_config("[package]\nnmae = \"typo\"\n").is_err());
        assert!(parse_config("keepTemp = true\n").is_err());
    }

    #[test]
    fn test_load_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "keep_temp = \"yes\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_config(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }
}
