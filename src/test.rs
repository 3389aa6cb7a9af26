//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::args::AddArgs;
use crate::model::{Amount, Category, DATE_FORMAT};
use crate::Config;
use chrono::NaiveDateTime;
use std::str::FromStr;
use tempfile::TempDir;

/// Test environment that sets up an expenses home directory with a Config.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a single-user test environment.
    pub async fn new() -> Self {
        Self::create(false).await
    }

    /// Creates a multi-user test environment.
    pub async fn multi_user() -> Self {
        Self::create(true).await
    }

    async fn create(multi_user: bool) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("expenses");
        let config = Config::create(&root, multi_user, None).await.unwrap();
        Self {
            temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config. Clones share store locks.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// A scratch directory that is removed with the environment.
    pub fn scratch(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    /// Adds the example expenses: 100 on food and 50 on travel in January 2024, then 30 on
    /// food in February 2024.
    pub async fn insert_scenario(&self, user: Option<&str>) {
        for (at, amount, category) in [
            ("2024-01-05 10:00", "100", Category::Food),
            ("2024-01-20 09:00", "50", Category::Travel),
            ("2024-02-01 08:00", "30", Category::Food),
        ] {
            crate::commands::add(self.config(), add_args(at, amount, category, user))
                .await
                .unwrap();
        }
    }
}

/// Builds `AddArgs` for a timestamped expense.
pub fn add_args(at: &str, amount: &str, category: Category, user: Option<&str>) -> AddArgs {
    AddArgs {
        amount: Amount::from_str(amount).unwrap(),
        category,
        note: None,
        user: user.map(str::to_string),
        at: Some(NaiveDateTime::parse_from_str(at, DATE_FORMAT).unwrap()),
    }
}
