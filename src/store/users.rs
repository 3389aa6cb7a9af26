//! Maps free-text usernames to the opaque keys that name their store files.
//!
//! The username a person types is never used to build a path. Instead, the first time a name is
//! seen it is assigned a random key, and the pair is recorded in `users.json`:
//!
//! ```json
//! {
//!   "users": {
//!     "alice": "6f1c2e0d9b7a4c1e8d3f5a2b9c0e7d4f"
//!   }
//! }
//! ```

use crate::utils;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// The longest username accepted.
pub const MAX_USERNAME_CHARS: usize = 20;

const USERS_JSON: &str = "users.json";

/// A validated, trimmed, non-empty username.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            bail!("Please enter a username to continue");
        }
        let len = name.chars().count();
        if len > MAX_USERNAME_CHARS {
            bail!("A username can be at most {MAX_USERNAME_CHARS} characters, got {len}");
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Username {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Username::new(s)
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
struct UsersFile {
    users: BTreeMap<String, String>,
}

/// The username registry stored in `users.json` inside the data directory.
#[derive(Debug, Clone)]
pub(crate) struct Users {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl Users {
    pub(crate) fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(USERS_JSON),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the key for `username`, creating and saving a new one if the name is new.
    pub(crate) async fn key_for(&self, username: &Username) -> Result<String> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        if let Some(key) = file.users.get(username.as_str()) {
            return Ok(key.clone());
        }
        let key = Uuid::new_v4().simple().to_string();
        file.users.insert(username.as_str().to_string(), key.clone());
        self.save(&file).await?;
        debug!("Registered new user '{username}'");
        Ok(key)
    }

    async fn load(&self) -> Result<UsersFile> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .with_context(|| format!("Unable to check for {}", self.path.display()))?
        {
            return Ok(UsersFile::default());
        }
        utils::deserialize(&self.path).await
    }

    /// Writes to a temporary file, then renames it over `users.json`.
    async fn save(&self, file: &UsersFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file).context("Unable to serialize users")?;
        let tmp = self.path.with_extension("json.tmp");
        utils::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Unable to replace {}", self.path.display()))
    }
}
