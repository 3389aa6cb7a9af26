//! Command handlers for the expenses CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod export;
mod init;
mod serve;
mod view;

use crate::app::{self, Action, Render};
use crate::error::{Error, ErrorType, IntoResult};
use crate::{store, Config, Result};
use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

pub use add::add;
pub use export::export;
pub use init::init;
pub use serve::serve;
pub use view::{list, summary};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads the configuration from `home` for the commands that need an initialized home.
///
/// # Errors
/// - Returns a config error if the home directory, `config.json` or the data directory is missing
///   or invalid.
pub async fn load_config(home: &Path) -> Result<Config> {
    Config::load(home)
        .await
        .context("Unable to load the configuration, run 'expenses init' first")
        .pub_result(ErrorType::Config)
}

/// Runs one interaction against the store selected by `user`.
pub(crate) async fn run(
    config: &Config,
    user: Option<&str>,
    action: Action,
    now: NaiveDateTime,
) -> Result<Render> {
    let owner = config.owner(user).pub_result(ErrorType::Request)?;
    app::interact(config.stores(), owner, action, now, config.currency())
        .await
        .map_err(|e| Error::new(store::error_type(&e), e))
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_config_errors_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let e = load_config(&dir.path().join("missing")).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Config);
        assert!(e.to_string().starts_with("config error: "), "{e}");

        tokio::fs::write(dir.path().join("config.json"), "not json")
            .await
            .unwrap();
        let e = load_config(dir.path()).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Config);
    }
}
