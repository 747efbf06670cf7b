//! Build RPM packages from a declarative file mapping.
//!
//! This crate stages source files into an rpmbuild tree, renders the spec
//! document from package metadata and hands both to `rpmbuild`:
//!
//! - **Path policy** - Lexical normalization, exclusion and temp-root guards
//! - **Staging planner** - File mappings to an ordered manifest plus the
//!   `chmod`/`chown`/`chgrp` lines derived from per-file attributes
//! - **Build root** - Wipe-and-recreate materialization of the manifest
//! - **Spec rendering** - Deterministic `%files` and script sections
//! - **Packaging** - rpmbuild invocation and artifact relocation
//!
//! # Architecture
//!
//! ```text
//! rpmstage.toml ──► pipeline::config ──► PackageConfig
//!                                          │
//!     sources (glob) ──► path_policy ──► plan ──► StagingPlan
//!                                                  │        │
//!                                      buildroot ◄─┘        └─► spec (MergedMetadata)
//!                                          │                      │
//!                                          └──────► packaging ◄───┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rpmstage::pipeline::{self, RunOptions};
//!
//! let config = pipeline::load_config("rpmstage.toml".as_ref())?;
//! let outcome = pipeline::build(&config, &RunOptions::new(std::env::current_dir()?))?;
//! println!("{}", outcome.artifact.display());
//! ```

pub mod buildroot;
pub mod error;
pub mod metadata;
pub mod packaging;
pub mod path_policy;
pub mod pipeline;
pub mod plan;
pub mod preflight;
pub mod process;
pub mod sources;
pub mod spec;

pub use buildroot::BuildRootLayout;
pub use error::{Error, Result};
pub use metadata::{MergedMetadata, PackageMetadata};
pub use pipeline::{build, BuildOutcome, PackageConfig, RunOptions};
pub use plan::{FileMappingEntry, PlacedFile, StagingManifest, StagingPlan};
