//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::store::Store;
use crate::Config;
use tempfile::TempDir;

/// Test environment that sets up a kpi home directory with a Config and an initialized data file.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with Config and a data file holding only the header.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("kpi");
        let config = Config::create(&root, None, None).await.unwrap();
        config.store().initialize().await.unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Overwrites the data file with `csv`.
    pub fn write_data(&self, csv: &str) {
        std::fs::write(self.config.data_path(), csv).unwrap();
    }
}
