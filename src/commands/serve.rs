//! Web server command handler.
//!
//! This module implements the `expenses serve` command which runs the web UI.

use crate::args::ServeArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{web, Config, Result};

/// Runs the web UI until the process is stopped.
///
/// The stylesheet is read once, before the server binds, and inlined into every page.
///
/// # Errors
/// - Returns a config error if the stylesheet is missing.
/// - Returns a service error if the listen address cannot be bound.
pub async fn serve(config: Config, args: ServeArgs) -> Result<Out<()>> {
    let stylesheet = config.stylesheet().await.pub_result(ErrorType::Config)?;
    let addr = args.addr.unwrap_or_else(|| config.listen_addr());
    web::run_server(web::AppState::new(config, stylesheet), addr)
        .await
        .pub_result(ErrorType::Service)?;
    Ok("Done running the web server".into())
}
