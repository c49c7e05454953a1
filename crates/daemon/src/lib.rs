//! # Direxplorer Daemon Library
//!
//! This crate provides the daemon (server) functionality for Direxplorer,
//! which exposes a configurable home directory on the host over HTTP.
//!
//! ## Overview
//!
//! - **Path Resolution**: Turn client-relative paths into absolute paths
//!   under the current home directory
//! - **Directory Operations**: Browse, search, create folders, delete
//! - **File Transfer**: Whole-file downloads and atomic uploads
//! - **Home Directory**: Replaceable at runtime, memory only
//! - **HTTP API**: actix-web routes under `/FileSystem/api`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Daemon Orchestrator                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                 HTTP Router (actix-web)               │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │  ┌────────────────────┐        ┌─────────────────────────┐  │
//! │  │ Directory Browser  │        │      File Transfer      │  │
//! │  └────────────────────┘        └─────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │       Path Resolver  ──reads──▶  Home Directory       │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daemon::{Config, DaemonOrchestrator};
//!
//! #[actix_web::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     DaemonOrchestrator::new(config).run().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`files`]: Path resolution and filesystem operations
//! - [`logging`]: Tracing subscriber setup
//! - [`router`]: HTTP routes
//! - [`orchestrator`]: Component wiring and server lifecycle

pub mod config;
pub mod files;
pub mod logging;
pub mod orchestrator;
pub mod router;

// Re-export protocol for convenience
pub use protocol;

// Re-export config types for convenience
pub use config::Config;

// Re-export files types for convenience
pub use files::{
    ContainmentPolicy, DirectoryBrowser, DownloadedFile, FileError, FileResult, FileTransfer,
    HomeDirectory, PathResolver,
};

// Re-export router types for convenience
pub use router::{register, FileRouter, RouterError, RouterResult};

// Re-export orchestrator types for convenience
pub use orchestrator::DaemonOrchestrator;
