//! Configuration file handling.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and decides whether the log is
//! single-user or multi-user, where the web server listens, which currency symbol is shown and
//! where the stylesheet lives.

use crate::store::{Owner, Stores, Username};
use crate::utils;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DATA_DIR: &str = "data";
const STYLE_CSS: &str = "style.css";
const DEFAULT_CURRENCY: &str = "₹";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8501";

/// The stylesheet written by `init`.
const DEFAULT_STYLESHEET: &str = include_str!("web/style.css");

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`.
///
/// A `Config` also owns the `Stores` registry, so every clone of one `Config` shares the same
/// store locks.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    data_dir: PathBuf,
    config_file: ConfigFile,
    stores: Stores,
}

impl Config {
    /// Creates the home directory, its data directory, an initial `config.json` and the default
    /// stylesheet. An existing stylesheet is left alone.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        multi_user: bool,
        listen_addr: Option<SocketAddr>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let data_dir = root.join(DATA_DIR);
        utils::make_dir(&data_dir).await?;

        let style = root.join(STYLE_CSS);
        if !style.is_file() {
            utils::write(&style, DEFAULT_STYLESHEET).await?;
        }

        let config_path = root.join(CONFIG_JSON);
        let mut config_file = ConfigFile {
            multi_user,
            ..ConfigFile::default()
        };
        if let Some(addr) = listen_addr {
            config_file.listen_addr = addr;
        }
        config_file.save(&config_path).await?;

        Ok(Self {
            stores: Stores::new(&data_dir),
            root,
            config_path,
            data_dir,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load the config file
    /// - validate that the data directory exists
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home directory is missing, run 'expenses init'")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let data_dir = root.join(DATA_DIR);
        if !data_dir.is_dir() {
            bail!("The data directory is missing '{}'", data_dir.display())
        }
        debug!("Loaded configuration from {}", config_path.display());

        Ok(Self {
            stores: Stores::new(&data_dir),
            root,
            config_path,
            data_dir,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn multi_user(&self) -> bool {
        self.config_file.multi_user
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.config_file.listen_addr
    }

    pub fn currency(&self) -> &str {
        &self.config_file.currency
    }

    /// Returns the configured stylesheet path if it is absolute, otherwise resolves it against
    /// the home directory.
    pub fn stylesheet_path(&self) -> PathBuf {
        let p = self.config_file.stylesheet_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Reads the stylesheet. There is no fallback: a missing stylesheet is an error.
    pub async fn stylesheet(&self) -> Result<String> {
        let path = self.stylesheet_path();
        utils::read(&path)
            .await
            .with_context(|| format!("The stylesheet is required at {}", path.display()))
    }

    /// Decides whose store to use given an optional username.
    ///
    /// In multi-user mode a username is required; in single-user mode it must not be given.
    pub fn owner(&self, user: Option<&str>) -> Result<Owner> {
        match (self.multi_user(), user) {
            (true, Some(name)) => Ok(Owner::User(Username::new(name)?)),
            (true, None) => bail!("Please enter a username to continue"),
            (false, None) => Ok(Owner::Shared),
            (false, Some(_)) => {
                bail!("This expense log is single-user, a username cannot be given")
            }
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "multi_user": true,
///   "listen_addr": "127.0.0.1:8501",
///   "currency": "₹",
///   "stylesheet_path": "style.css"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// One store per username when true, a single shared store when false
    #[serde(default)]
    multi_user: bool,

    /// Where the web server listens
    #[serde(default = "default_listen_addr")]
    listen_addr: SocketAddr,

    /// The currency symbol shown in front of amounts
    #[serde(default = "default_currency")]
    currency: String,

    /// Path to the stylesheet (optional, relative to the home directory or absolute)
    /// Defaults to $EXPENSES_HOME/style.css if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    stylesheet_path: Option<PathBuf>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8501))
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            multi_user: false,
            listen_addr: default_listen_addr(),
            currency: default_currency(),
            stylesheet_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Config version {} is unsupported. Is a newer version of expenses available?",
            config.config_version
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the stylesheet path, defaulting to `style.css` relative to the home directory.
    fn stylesheet_path(&self) -> PathBuf {
        self.stylesheet_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(STYLE_CSS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_listen_addr_matches_constant() {
        assert_eq!(default_listen_addr().to_string(), DEFAULT_LISTEN_ADDR);
    }

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("expenses_home");

        let created = Config::create(&home, true, None).await.unwrap();
        assert!(created.data_dir().is_dir());
        assert!(created.stylesheet_path().is_file());
        assert!(created.multi_user());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert!(loaded.multi_user());
        assert_eq!(loaded.currency(), "₹");
        assert_eq!(loaded.listen_addr(), default_listen_addr());
        assert!(loaded.stylesheet().await.unwrap().contains(".total"));
    }

    #[tokio::test]
    async fn test_create_keeps_existing_stylesheet() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().to_owned();
        utils::write(home.join(STYLE_CSS), "body { color: red; }")
            .await
            .unwrap();
        let config = Config::create(&home, false, None).await.unwrap();
        assert_eq!(config.stylesheet().await.unwrap(), "body { color: red; }");
    }

    #[tokio::test]
    async fn test_missing_stylesheet_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), false, None).await.unwrap();
        tokio::fs::remove_file(config.stylesheet_path()).await.unwrap();
        let e = config.stylesheet().await.unwrap_err();
        assert!(e.to_string().contains("stylesheet is required"));
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "expenses", "config_version": 1 }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert!(!config.multi_user);
        assert_eq!(config.currency, "₹");
        assert_eq!(config.stylesheet_path(), PathBuf::from(STYLE_CSS));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "budget", "config_version": 1 }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("stylesheet_path"));
    }

    #[tokio::test]
    async fn test_owner_rules() {
        let dir = TempDir::new().unwrap();
        let multi = Config::create(dir.path().join("m"), true, None)
            .await
            .unwrap();
        assert!(matches!(multi.owner(Some("ann")).unwrap(), Owner::User(_)));
        assert!(multi.owner(None).is_err());
        assert!(multi.owner(Some("  ")).is_err());

        let single = Config::create(dir.path().join("s"), false, None)
            .await
            .unwrap();
        assert_eq!(single.owner(None).unwrap(), Owner::Shared);
        assert!(single.owner(Some("ann")).is_err());
    }
}
