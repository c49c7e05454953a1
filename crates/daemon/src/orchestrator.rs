//! Daemon orchestrator for wiring together all components.
//!
//! This module provides the `DaemonOrchestrator` that builds the home
//! directory handle, path resolver, directory browser and file transfer
//! handler from the configuration, and serves them over HTTP.

use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::files::{DirectoryBrowser, FileTransfer, HomeDirectory, PathResolver};
use crate::router::{register, FileRouter};

/// Daemon orchestrator that owns all file handles.
pub struct DaemonOrchestrator {
    /// Configuration.
    config: Config,
    /// Runtime-replaceable home directory.
    home: Arc<HomeDirectory>,
    /// Directory browser for listing, search, create and delete.
    directory_browser: Arc<DirectoryBrowser>,
    /// File transfer handler.
    file_transfer: Arc<FileTransfer>,
}

impl DaemonOrchestrator {
    /// Creates a new daemon orchestrator.
    ///
    /// A missing initial home directory is only a warning: operations fail
    /// until a valid one is set through the API.
    pub fn new(config: Config) -> Self {
        let home_path = config.explorer.home_directory.clone();
        if !home_path.is_dir() {
            warn!(home = ?home_path, "Configured home directory does not exist");
        }

        let home = Arc::new(HomeDirectory::new(home_path));
        let resolver = Arc::new(
            PathResolver::new(Arc::clone(&home)).with_policy(config.explorer.containment),
        );

        let directory_browser = Arc::new(DirectoryBrowser::new(Arc::clone(&resolver)));
        let file_transfer = Arc::new(FileTransfer::new(
            resolver,
            config.explorer.max_upload_size,
        ));

        Self {
            config,
            home,
            directory_browser,
            file_transfer,
        }
    }

    /// Returns the configuration the orchestrator was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the shared home directory handle.
    pub fn home(&self) -> &Arc<HomeDirectory> {
        &self.home
    }

    /// Build the route state sharing this orchestrator's handles.
    pub fn router(&self) -> FileRouter {
        FileRouter::new(
            Arc::clone(&self.home),
            Arc::clone(&self.directory_browser),
            Arc::clone(&self.file_transfer),
        )
    }

    /// Bind and serve until the process is asked to shut down.
    pub async fn run(self) -> Result<()> {
        let bind_address = self.config.bind_address();
        let router = web::Data::new(self.router());

        info!(
            address = %bind_address,
            home = ?self.home.current(),
            containment = ?self.config.explorer.containment,
            "Starting Direxplorer daemon"
        );

        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .app_data(router.clone())
                .configure(register)
        });

        if self.config.server.workers > 0 {
            server = server.workers(self.config.server.workers);
        }

        server
            .bind(&bind_address)
            .with_context(|| format!("Failed to bind {bind_address}"))?
            .run()
            .await
            .context("HTTP server terminated with an error")?;

        info!("Direxplorer daemon stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::ContainmentPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config(home: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.explorer.home_directory = home.to_path_buf();
        config
    }

    #[test]
    fn test_orchestrator_uses_configured_home() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = DaemonOrchestrator::new(create_test_config(temp_dir.path()));

        assert_eq!(*orchestrator.home().current(), temp_dir.path());
    }

    #[test]
    fn test_orchestrator_accepts_missing_home() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let orchestrator = DaemonOrchestrator::new(create_test_config(&missing));

        assert_eq!(*orchestrator.home().current(), missing);
    }

    #[test]
    fn test_orchestrator_applies_containment() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        fs::create_dir_all(&home).unwrap();
        fs::write(temp_dir.path().join("outside.txt"), "x").unwrap();

        let mut config = create_test_config(&home);
        config.explorer.containment = ContainmentPolicy::Confined;
        let orchestrator = DaemonOrchestrator::new(config);

        assert!(orchestrator.directory_browser.browse("..").is_err());
        assert!(orchestrator.file_transfer.download("../outside.txt").is_err());
    }

    #[test]
    fn test_orchestrator_shares_home_between_handles() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("moved.txt"), "x").unwrap();
        let orchestrator = DaemonOrchestrator::new(create_test_config(first.path()));

        orchestrator
            .home()
            .set(second.path().to_str().unwrap())
            .unwrap();

        let file = orchestrator.file_transfer.download("moved.txt").unwrap();
        assert_eq!(file.content, b"x");
    }
}
