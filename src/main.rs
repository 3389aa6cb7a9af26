use clap::Parser;
use expense_log::args::{Args, Command};
use expense_log::{commands, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Add(add_args) => {
            let config = commands::load_config(home).await?;
            commands::add(config, add_args.clone()).await?.print()
        }

        Command::List(range_args) => {
            let config = commands::load_config(home).await?;
            commands::list(config, range_args.clone()).await?.print()
        }

        Command::Summary(range_args) => {
            let config = commands::load_config(home).await?;
            commands::summary(config, range_args.clone()).await?.print()
        }

        Command::Export(export_args) => {
            let config = commands::load_config(home).await?;
            commands::export(config, export_args.clone()).await?.print()
        }

        Command::Serve(serve_args) => {
            let config = commands::load_config(home).await?;
            commands::serve(config, serve_args.clone()).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the log level for the library and the binary only.
            EnvFilter::new(format!(
                "{}={level},{}={level}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                env!("CARGO_CRATE_NAME"),
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
