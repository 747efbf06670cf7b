//! Staging planner: turns file-mapping declarations into an ordered manifest.
//!
//! Planning reads the filesystem (glob expansion, directory checks) but never
//! writes to it. The manifest order is the traversal order of the entries and
//! then of each entry's expanded sources; it becomes the `%files` order.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::metadata::{MergedMetadata, PackageMetadata};
use crate::path_policy::{absolutize, is_excluded, is_self_referential, join_installed, ExclusionSet};
use crate::sources::expand_sources;

/// One declared mapping of source patterns to a destination directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMappingEntry {
    /// Glob patterns, resolved below `working_dir` when set.
    pub source: Option<Vec<String>>,
    /// Installation directory the sources are placed under.
    pub destination: Option<String>,
    pub working_dir: Option<PathBuf>,
    /// Permission string passed to `chmod`, e.g. `755`.
    pub mode: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Where relative paths resolve and which temp root the run owns.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub base_dir: PathBuf,
    pub temp_root: PathBuf,
}

/// A file that will be copied into the build root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedFile {
    /// Absolute path of the file on the build host.
    pub source: PathBuf,
    /// Path of the file once the package is installed.
    pub installed_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingManifest {
    files: Vec<PlacedFile>,
}

impl StagingManifest {
    pub fn files(&self) -> &[PlacedFile] {
        &self.files
    }

    pub fn installed_paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.installed_path.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Excluded,
    Directory,
    SelfReferential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub source: String,
    pub reason: SkipReason,
}

/// Everything a run needs from planning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StagingPlan {
    pub manifest: StagingManifest,
    /// `chmod`/`chown`/`chgrp` lines in discovery order.
    pub attribute_script: Vec<String>,
    pub skipped: Vec<SkippedSource>,
}

impl StagingPlan {
    /// Append the attribute script to the declared post-install lines.
    pub fn merge(&self, metadata: &PackageMetadata) -> MergedMetadata {
        MergedMetadata::new(metadata, &self.attribute_script)
    }

    fn skip(&mut self, source: String, reason: SkipReason) {
        self.skipped.push(SkippedSource { source, reason });
    }
}

#[derive(Debug)]
struct ValidEntry<'a> {
    source: &'a [String],
    destination: &'a str,
    entry: &'a FileMappingEntry,
}

/// Check that every entry declares both a source and a destination.
fn validate(entries: &[FileMappingEntry]) -> Result<Vec<ValidEntry<'_>>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let source = match entry.source.as_deref() {
                Some(patterns) if !patterns.is_empty() => patterns,
                _ => {
                    return Err(Error::config(format!(
                        "file entry #{index} has no source; every entry needs both source and destination"
                    )))
                }
            };
            let destination = match entry.destination.as_deref() {
                Some(dest) if !dest.trim().is_empty() => dest,
                _ => {
                    return Err(Error::config(format!(
                        "file entry #{index} has no destination; every entry needs both source and destination"
                    )))
                }
            };
            Ok(ValidEntry {
                source,
                destination,
                entry,
            })
        })
        .collect()
}

/// Build the staging plan for `entries`.
///
/// All entries are validated before any of them is expanded.
pub fn plan(
    entries: &[FileMappingEntry],
    exclusions: &ExclusionSet,
    context: &PlanContext,
) -> Result<StagingPlan> {
    let entries = validate(entries)?;
    let temp_root = absolutize(&context.temp_root, &context.base_dir);

    let mut plan = StagingPlan::default();
    for valid in entries {
        let root = match &valid.entry.working_dir {
            Some(dir) => absolutize(dir, &context.base_dir),
            None => context.base_dir.clone(),
        };

        for declared in expand_sources(valid.source, &root)? {
            if is_excluded(&declared, exclusions) {
                info!("Exclude: {declared}");
                plan.skip(declared, SkipReason::Excluded);
                continue;
            }

            let resolved = absolutize(&declared, &root);
            if resolved.is_dir() {
                debug!(source = %resolved.display(), "skipping directory");
                plan.skip(declared, SkipReason::Directory);
                continue;
            }
            if is_self_referential(&resolved, &temp_root) {
                debug!(source = %resolved.display(), "skipping path inside the temp root");
                plan.skip(declared, SkipReason::SelfReferential);
                continue;
            }

            let installed_path = join_installed(valid.destination, &declared);
            push_attribute_lines(&mut plan.attribute_script, valid.entry, &installed_path);
            plan.manifest.files.push(PlacedFile {
                source: resolved,
                installed_path,
            });
        }
    }

    Ok(plan)
}

fn push_attribute_lines(script: &mut Vec<String>, entry: &FileMappingEntry, installed: &str) {
    let attributes = [
        ("chmod", &entry.mode),
        ("chown", &entry.owner),
        ("chgrp", &entry.group),
    ];
    for (command, value) in attributes {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            script.push(format!("{command} {value} {installed}"));
        }
    }
}

/// Where the copy of `file` lives inside `build_root`.
pub fn staged_path(build_root: &Path, file: &PlacedFile) -> PathBuf {
    build_root.join(file.installed_path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_policy::ExclusionSet;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PlanContext) {
        let temp = TempDir::new().unwrap();
        let base = temp.path().to_path_buf();
        fs::write(base.join("a.txt"), "a").unwrap();
        fs::write(base.join("b.txt"), "b").unwrap();
        fs::create_dir_all(base.join("dist/bin")).unwrap();
        fs::write(base.join("dist/bin/run"), "#!/bin/sh\n").unwrap();
        fs::write(base.join("dist/README"), "readme").unwrap();
        let context = PlanContext {
            temp_root: base.join("rpmstage-tmp-test"),
            base_dir: base,
        };
        (temp, context)
    }

    fn entry(sources: &[&str], destination: &str) -> FileMappingEntry {
        FileMappingEntry {
            source: Some(sources.iter().map(|s| s.to_string()).collect()),
            destination: Some(destination.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_file_without_attributes() {
        let (_temp, context) = fixture();
        let plan = plan(&[entry(&["a.txt"], "/opt/app")], &ExclusionSet::new(), &context).unwrap();

        assert_eq!(plan.manifest.len(), 1);
        let file = &plan.manifest.files()[0];
        assert_eq!(file.installed_path, "/opt/app/a.txt");
        assert_eq!(file.source, context.base_dir.join("a.txt"));
        assert!(plan.attribute_script.is_empty());
    }

    #[test]
    fn test_mode_owner_group_emit_lines_in_order() {
        let (_temp, context) = fixture();
        let mut with_attrs = entry(&["a.txt", "b.txt"], "/opt/app");
        with_attrs.mode = Some("755".into());
        with_attrs.owner = Some("app".into());
        with_attrs.group = Some("wheel".into());

        let plan = plan(&[with_attrs], &ExclusionSet::new(), &context).unwrap();
        assert_eq!(
            plan.attribute_script,
            vec![
                "chmod 755 /opt/app/a.txt",
                "chown app /opt/app/a.txt",
                "chgrp wheel /opt/app/a.txt",
                "chmod 755 /opt/app/b.txt",
                "chown app /opt/app/b.txt",
                "chgrp wheel /opt/app/b.txt",
            ]
        );
    }

    #[test]
    fn test_only_declared_attributes_emit_lines() {
        let (_temp, context) = fixture();
        let mut only_group = entry(&["a.txt"], "/opt/app");
        only_group.group = Some("users".into());

        let plan = plan(&[only_group], &ExclusionSet::new(), &context).unwrap();
        assert_eq!(plan.attribute_script, vec!["chgrp users /opt/app/a.txt"]);
    }

    #[test]
    fn test_excluded_source_never_reaches_manifest() {
        let (_temp, context) = fixture();
        let exclusions = ExclusionSet::from_paths(["a.txt"]);
        let mut excluded = entry(&["a.txt"], "/opt/app");
        excluded.mode = Some("600".into());

        let plan = plan(&[excluded], &exclusions, &context).unwrap();
        assert!(plan.manifest.is_empty());
        assert!(plan.attribute_script.is_empty());
        assert_eq!(
            plan.skipped,
            vec![SkippedSource {
                source: "a.txt".into(),
                reason: SkipReason::Excluded
            }]
        );
    }

    #[test]
    fn test_exclusion_is_order_independent() {
        let (_temp, context) = fixture();
        let exclusions = ExclusionSet::from_paths(["b.txt"]);
        let entries = [entry(&["b.txt", "a.txt"], "/x"), entry(&["*.txt"], "/y")];

        let plan = plan(&entries, &exclusions, &context).unwrap();
        let installed: Vec<&str> = plan.manifest.installed_paths().collect();
        assert_eq!(installed, vec!["/x/a.txt", "/y/a.txt"]);
    }

    #[test]
    fn test_directories_are_skipped() {
        let (_temp, context) = fixture();
        let plan = plan(&[entry(&["dist/*"], "/opt/app")], &ExclusionSet::new(), &context).unwrap();

        let installed: Vec<&str> = plan.manifest.installed_paths().collect();
        assert_eq!(installed, vec!["/opt/app/dist/README"]);
        assert!(plan
            .skipped
            .iter()
            .any(|s| s.source == "dist/bin" && s.reason == SkipReason::Directory));
    }

    #[test]
    fn test_working_dir_does_not_leak_into_installed_path() {
        let (_temp, context) = fixture();
        let mut in_dist = entry(&["bin/run"], "/usr/lib/app");
        in_dist.working_dir = Some(PathBuf::from("dist"));
        in_dist.mode = Some("755".into());

        let plan = plan(&[in_dist], &ExclusionSet::new(), &context).unwrap();
        let file = &plan.manifest.files()[0];
        assert_eq!(file.installed_path, "/usr/lib/app/bin/run");
        assert_eq!(file.source, context.base_dir.join("dist/bin/run"));
        assert_eq!(plan.attribute_script, vec!["chmod 755 /usr/lib/app/bin/run"]);
    }

    #[test]
    fn test_files_inside_temp_root_are_skipped() {
        let (_temp, context) = fixture();
        fs::create_dir_all(context.temp_root.join("BUILDROOT/opt")).unwrap();
        fs::write(context.temp_root.join("BUILDROOT/opt/a.txt"), "stale").unwrap();

        let plan = plan(
            &[entry(&["**/*.txt"], "/opt")],
            &ExclusionSet::new(),
            &context,
        )
        .unwrap();

        let installed: Vec<&str> = plan.manifest.installed_paths().collect();
        assert_eq!(installed, vec!["/opt/a.txt", "/opt/b.txt"]);
        assert!(plan
            .skipped
            .iter()
            .any(|s| s.reason == SkipReason::SelfReferential));
    }

    #[test]
    fn test_missing_destination_is_configuration_error() {
        let (_temp, context) = fixture();
        let entries = [
            entry(&["a.txt"], "/opt"),
            FileMappingEntry {
                source: Some(vec!["b.txt".into()]),
                ..Default::default()
            },
        ];

        let err = plan(&entries, &ExclusionSet::new(), &context).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("#1"));
    }

    #[test]
    fn test_missing_source_is_configuration_error() {
        let entries = [FileMappingEntry {
            source: Some(vec![]),
            destination: Some("/opt".into()),
            ..Default::default()
        }];
        let err = validate(&entries).unwrap_err();
        assert!(err.to_string().contains("no source"));
    }

    #[test]
    fn test_merge_keeps_declared_lines_first() {
        let (_temp, context) = fixture();
        let mut with_mode = entry(&["a.txt"], "/opt/app");
        with_mode.mode = Some("755".into());
        let plan = plan(&[with_mode], &ExclusionSet::new(), &context).unwrap();

        let metadata = PackageMetadata {
            post_install: vec!["echo installed".into()],
            ..Default::default()
        };
        let merged = plan.merge(&metadata);
        assert_eq!(
            merged.post_install,
            vec!["echo installed", "chmod 755 /opt/app/a.txt"]
        );
    }

    #[test]
    fn test_staged_path() {
        let file = PlacedFile {
            source: PathBuf::from("/src/a.txt"),
            installed_path: "/opt/app/a.txt".into(),
        };
        assert_eq!(
            staged_path(Path::new("/tmp/root/BUILDROOT"), &file),
            PathBuf::from("/tmp/root/BUILDROOT/opt/app/a.txt")
        );
    }
}
