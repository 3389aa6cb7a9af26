use crate::args::InitArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, the data directory, `config.json` and the default stylesheet.
///
/// # Arguments
/// - `home` - The directory that will hold everything, e.g. `$HOME/expenses`
/// - `args` - Whether the log is multi-user and, optionally, the web UI listen address.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(home, args.multi_user, args.addr)
        .await
        .context("Unable to create the home directory and config")
        .pub_result(ErrorType::Config)?;
    let mode = if config.multi_user() {
        "multi-user"
    } else {
        "single-user"
    };
    Ok(format!(
        "Created a {mode} expense log in {}",
        config.root().display()
    )
    .into())
}
