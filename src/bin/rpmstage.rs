use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rpmstage::pipeline::{self, PackageConfig, RunOptions, DEFAULT_CONFIG_FILE};
use rpmstage::{packaging, preflight};
use tracing::info;

#[derive(Parser)]
#[command(name = "rpmstage")]
#[command(about = "Stage files into an RPM build root and build the package")]
#[command(
    after_help = "QUICK START:\n  rpmstage preflight  Check that rpmbuild is installed\n  rpmstage plan       Show which files would be packaged\n  rpmstage spec       Print the generated spec file\n  rpmstage build      Build the .rpm into the current directory"
)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage files, render the spec and run rpmbuild
    Build {
        #[command(flatten)]
        run: RunArgs,

        /// Keep the temp directory after a successful build
        #[arg(long)]
        keep_temp: bool,

        /// Directory the finished package is copied to (default: current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Packaging tool to run instead of rpmbuild from PATH
        #[arg(long)]
        rpmbuild: Option<PathBuf>,
    },

    /// Print the staging manifest and attribute script as JSON
    Plan {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the spec file a build would write
    Spec {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Check that the packaging tools are installed
    Preflight,
}

#[derive(Args)]
struct RunArgs {
    /// Config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Temp directory to stage into (default: rpmstage-tmp-<random>)
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("resolving current directory")?;

    match cli.command {
        Commands::Build {
            run,
            keep_temp,
            output_dir,
            rpmbuild,
        } => {
            let (config, mut options) = load(&run, &cwd)?;
            options.keep_temp = keep_temp;
            options.rpmbuild = rpmbuild;
            if let Some(dir) = output_dir {
                options.output_dir = rpmstage::path_policy::absolutize(dir, &cwd);
            }

            let outcome = pipeline::build(&config, &options)
                .with_context(|| format!("building package '{}'", config.metadata.name))?;

            println!("{}", outcome.artifact.display());
            println!("  sha256: {}", outcome.sha256);
            println!("  files:  {}", outcome.staged_files);
            if outcome.temp_retained {
                println!("  temp:   {}", outcome.temp_root.display());
            }
        }
        Commands::Plan { run } => {
            let (config, options) = load(&run, &cwd)?;
            let layout = pipeline::resolve_layout(&config, &options);
            let plan = pipeline::plan_for(&config, &options, &layout)
                .context("planning build root")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("serializing plan")?
            );
        }
        Commands::Spec { run } => {
            let (config, options) = load(&run, &cwd)?;
            let doc = pipeline::render_spec(&config, &options).context("rendering spec")?;
            println!("{doc}");
        }
        Commands::Preflight => run_preflight()?,
    }

    Ok(())
}

fn load(run: &RunArgs, cwd: &Path) -> Result<(PackageConfig, RunOptions)> {
    let config_path = rpmstage::path_policy::absolutize(&run.config, cwd);
    let config = pipeline::load_config(&config_path)
        .with_context(|| format!("loading config '{}'", config_path.display()))?;

    let mut options = RunOptions::new(cwd);
    options.temp_dir = run.temp_dir.clone();
    Ok((config, options))
}

fn run_preflight() -> Result<()> {
    preflight::check_host_tools().context("preflight failed")?;
    let tool = packaging::resolve_tool(None)?;
    match preflight::tool_version(&tool) {
        Some(version) => info!("{} ({})", tool.display(), version),
        None => info!("{}", tool.display()),
    }
    println!("preflight ok");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
