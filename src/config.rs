//! Configuration file handling for the dashboard.
//!
//! The configuration file is stored at `$KPI_HOME/config.json` and names the data file and the
//! address the dashboard server listens on.

use crate::error::{ErrorType, IntoResult, Res};
use crate::store::CsvStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "kpi";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";

/// The default name of the data file, relative to `$KPI_HOME`.
pub const DATA_FILE: &str = "kpi_data.csv";

/// The default address of the dashboard server.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8050";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$KPI_HOME` and from there it loads `$KPI_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    data_path: PathBuf,
    listen: SocketAddr,
}

impl Config {
    /// Creates the data directory and writes an initial `config.json`. An existing `config.json`
    /// is replaced; an existing data file is left alone.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/kpi`
    /// - `data_file` - The CSV file, absolute or relative to `dir`. Defaults to `kpi_data.csv`.
    /// - `listen` - The address for `kpi serve`. Defaults to `127.0.0.1:8050`.
    pub async fn create(
        dir: impl Into<PathBuf>,
        data_file: Option<&Path>,
        listen: Option<SocketAddr>,
    ) -> Result<Self> {
        Self::create_inner(dir.into(), data_file, listen)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(
        maybe_relative: PathBuf,
        data_file: Option<&Path>,
        listen: Option<SocketAddr>,
    ) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the kpi home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            data_file: data_file.map_or_else(|| PathBuf::from(DATA_FILE), Path::to_path_buf),
            listen: listen.map_or_else(|| DEFAULT_LISTEN.to_string(), |a| a.to_string()),
        };
        config_file.save(&config_path).await?;
        Self::from_parts(root, config_path, config_file)
    }

    /// This will
    /// - validate that `kpi_home` exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(kpi_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(kpi_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        if !maybe_relative.is_dir() {
            bail!(
                "The kpi home directory '{}' is missing, run 'kpi init' first",
                maybe_relative.display()
            );
        }
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file '{}' is missing, run 'kpi init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;
        debug!("Loaded {}", config_path.display());
        Self::from_parts(root, config_path, config_file)
    }

    fn from_parts(root: PathBuf, config_path: PathBuf, config_file: ConfigFile) -> Res<Self> {
        let listen = config_file
            .listen
            .parse()
            .with_context(|| format!("Invalid listen address '{}'", config_file.listen))?;
        let data_path = if config_file.data_file.is_absolute() {
            config_file.data_file.clone()
        } else {
            root.join(&config_file.data_file)
        };
        Ok(Self {
            root,
            config_path,
            config_file,
            data_path,
            listen,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The absolute path of the CSV data file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn listen(&self) -> SocketAddr {
        self.listen
    }

    pub fn config_version(&self) -> u8 {
        self.config_file.config_version
    }

    /// The record store backed by the data file.
    pub fn store(&self) -> CsvStore {
        CsvStore::new(&self.data_path)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "kpi",
///   "config_version": 1,
///   "data_file": "kpi_data.csv",
///   "listen": "127.0.0.1:8050"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "kpi"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The CSV data file, relative to config.json or absolute
    #[serde(default = "default_data_file")]
    data_file: PathBuf,

    /// The socket address for the dashboard server
    #[serde(default = "default_listen")]
    listen: String,
}

fn default_data_file() -> PathBuf {
    PathBuf::from(DATA_FILE)
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }
}
