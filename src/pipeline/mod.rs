//! One packaging run, end to end.
//!
//! Steps run strictly in sequence and the first failure ends the run:
//!
//! ```text
//! resolve temp root + tool
//!   -> exclusions -> plan (validates every entry first)
//!   -> materialize -> verify
//!   -> merge attribute script -> write spec
//!   -> rpmbuild -> relocate artifact -> cleanup
//! ```
//!
//! Nothing is rolled back on failure; the temp root is left for inspection.

pub mod config;
pub mod paths;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::buildroot::{self, BuildRootLayout};
use crate::error::Result;
use crate::packaging;
use crate::plan::{self, PlanContext, StagingPlan};
use crate::sources::expand_exclusions;
use crate::spec;

pub use config::{load_config, parse_config, PackageConfig, DEFAULT_CONFIG_FILE};
pub use paths::{check_temp_root, default_temp_dir_name, resolve_temp_root, TEMP_DIR_PREFIX};

/// Per-invocation settings that override the config file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory relative sources, exclusions and temp dirs resolve against.
    pub base_dir: PathBuf,
    /// Where the finished package is copied.
    pub output_dir: PathBuf,
    pub temp_dir: Option<PathBuf>,
    pub keep_temp: bool,
    pub rpmbuild: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            output_dir: base_dir.clone(),
            base_dir,
            temp_dir: None,
            keep_temp: false,
            rpmbuild: None,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub artifact: PathBuf,
    pub sha256: String,
    pub spec_path: PathBuf,
    pub staged_files: usize,
    pub temp_root: PathBuf,
    pub temp_retained: bool,
}

/// Resolve the layout this run owns. Without a pinned temp dir every call
/// yields a fresh randomized root.
pub fn resolve_layout(config: &PackageConfig, options: &RunOptions) -> BuildRootLayout {
    let pinned = options.temp_dir.as_deref().or(config.temp_dir.as_deref());
    BuildRootLayout::new(resolve_temp_root(&options.base_dir, pinned))
}

/// Plan against `layout` without writing to the filesystem.
///
/// Fails if the layout's temp root would swallow the base directory.
pub fn plan_for(
    config: &PackageConfig,
    options: &RunOptions,
    layout: &BuildRootLayout,
) -> Result<StagingPlan> {
    check_temp_root(&options.base_dir, layout.root())?;
    let exclusions = expand_exclusions(&config.exclude_files, &options.base_dir)?;
    let context = PlanContext {
        base_dir: options.base_dir.clone(),
        temp_root: layout.root().to_path_buf(),
    };
    let plan = plan::plan(&config.files, &exclusions, &context)?;
    info!(
        staged = plan.manifest.len(),
        skipped = plan.skipped.len(),
        "planned build root"
    );
    Ok(plan)
}

/// Render the spec a run would write, without staging anything.
pub fn render_spec(config: &PackageConfig, options: &RunOptions) -> Result<String> {
    let layout = resolve_layout(config, options);
    let plan = plan_for(config, options, &layout)?;
    let merged = plan.merge(&config.metadata);
    Ok(spec::render(&merged, layout.root(), &plan.manifest))
}

/// Run the whole packaging pipeline.
pub fn build(config: &PackageConfig, options: &RunOptions) -> Result<BuildOutcome> {
    let layout = resolve_layout(config, options);
    let explicit_tool = options.rpmbuild.as_deref().or(config.rpmbuild.as_deref());
    let tool = packaging::resolve_tool(explicit_tool)?;
    let keep_temp = options.keep_temp || config.keep_temp;

    let plan = plan_for(config, options, &layout)?;

    buildroot::materialize(&layout, &plan.manifest)?;
    buildroot::verify(&layout, &plan.manifest)?;

    let merged = plan.merge(&config.metadata);
    let spec_path = spec::write_spec(&layout, &merged, &plan.manifest)?;

    packaging::invoke(&tool, &layout, &spec_path)?;
    let artifact = packaging::relocate(&layout, &merged, &options.output_dir)?;
    let sha256 = buildroot::sha256_file(&artifact)?;
    info!(sha256 = %sha256, "built {}", display_name(&artifact));

    packaging::cleanup(&layout, keep_temp)?;

    Ok(BuildOutcome {
        artifact,
        sha256,
        spec_path,
        staged_files: plan.manifest.len(),
        temp_root: layout.root().to_path_buf(),
        temp_retained: keep_temp,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
