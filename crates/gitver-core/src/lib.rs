//! Core library for gitver.
//!
//! This crate provides the foundational types and functionality used by the
//! `gitver` CLI and any downstream consumers.
//!
//! # Modules
//!
//! - [`config`] - Tool settings loading and discovery
//! - [`error`] - Error types and result aliases
//! - [`git`] - Repository snapshot and ref/commit writes
//! - [`init`] - Starter version file templates
//! - [`locate`] - Version file discovery
//! - [`release`] - Release branch planning and execution
//! - [`resolve`] - Version resolution facade
//! - [`rules`] - Branch rule selection
//! - [`schema`] - Schema template rendering
//! - [`version`] - Version components, bump, and validation
//! - [`version_file`] - The `version.yml` document
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use gitver_core::git::GitCli;
//! use gitver_core::resolve::{ResolveOptions, VersionInfo};
//!
//! let cwd = Utf8Path::new(".");
//! let git = GitCli::new(cwd).expect("git is installed");
//! let mut info = VersionInfo::resolve(&git, cwd, &ResolveOptions::default())
//!     .expect("version resolved");
//!
//! println!("{}", info.version().expect("version rendered"));
//! ```
#![deny(unsafe_code)]

pub mod config;

pub mod error;

pub mod git;

pub mod init;

pub mod locate;

pub mod release;

pub mod resolve;

pub mod rules;

pub mod schema;

pub mod version;

pub mod version_file;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult, ResolveError, ResolveResult};

pub use resolve::{ResolveOptions, VersionInfo};

pub use version::{VersionComponent, VersionState};
