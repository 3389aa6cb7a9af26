//! These structs provide the CLI interface for the expenses CLI.

use crate::model::{Amount, Category, DATE_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: track your little spends.
///
/// Log expenses into a CSV file and see where the money went: totals over a date range, a
/// breakdown by category and the top category of every month. Use the `serve` subcommand for a
/// web UI with a form and a pie chart.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory, the configuration file and the default stylesheet.
    ///
    /// Run this once before anything else. Pass --multi-user to keep a separate store for every
    /// username; otherwise all expenses go into one shared store.
    Init(InitArgs),
    /// Log a new expense.
    Add(AddArgs),
    /// List the expenses in a date range, most recent first.
    List(RangeArgs),
    /// Show the total, the breakdown by category and the top category of each month.
    Summary(RangeArgs),
    /// Write the expenses in a date range to a CSV file.
    Export(ExportArgs),
    /// Run the web UI.
    Serve(ServeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where expense data and configuration is held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `expenses init` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct InitArgs {
    /// Keep one store per username instead of a single shared store.
    #[arg(long)]
    pub multi_user: bool,

    /// The address the web UI listens on, e.g. 127.0.0.1:8501
    #[arg(long)]
    pub addr: Option<SocketAddr>,
}

/// Args for the `expenses add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The amount spent. Must be greater than zero.
    #[arg(long)]
    pub amount: Amount,

    /// One of: food, shopping, travel, fun, other
    #[arg(long)]
    pub category: Category,

    /// An optional note or emoji.
    #[arg(long)]
    pub note: Option<String>,

    /// Whose store to add to. Required in multi-user mode.
    #[arg(long)]
    pub user: Option<String>,

    /// When the expense happened, as "YYYY-MM-DD HH:MM". Defaults to now.
    #[arg(long, value_parser = parse_minute)]
    pub at: Option<NaiveDateTime>,
}

/// Args for commands that read a date range of one store.
#[derive(Debug, Parser, Clone, Default)]
pub struct RangeArgs {
    /// Whose store to read. Required in multi-user mode.
    #[arg(long)]
    pub user: Option<String>,

    /// The first day to include, as YYYY-MM-DD. Defaults to the earliest expense.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// The last day to include, as YYYY-MM-DD. Defaults to the latest expense.
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

/// Args for the `expenses export` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ExportArgs {
    #[clap(flatten)]
    pub range: RangeArgs,

    /// Where to write the CSV. Defaults to `<user>_expenses.csv` in the current directory.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Args for the `expenses serve` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ServeArgs {
    /// Overrides the listen address from the configuration file.
    #[arg(long)]
    pub addr: Option<SocketAddr>,
}

fn parse_minute(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM\": {e}"))
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or EXPENSES_HOME instead of relying on the default \
                directory. If you continue using the program right now, you may have problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "expenses",
            "--home",
            "/tmp/x",
            "add",
            "--amount",
            "120",
            "--category",
            "food",
            "--at",
            "2024-01-05 10:00",
        ])
        .unwrap();
        assert_eq!(args.common().home().path(), Path::new("/tmp/x"));
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        assert_eq!(add.amount.to_string(), "120");
        assert_eq!(add.category, Category::Food);
        assert_eq!(add.at.unwrap().format(DATE_FORMAT).to_string(), "2024-01-05 10:00");
    }

    #[test]
    fn test_reject_zero_amount_and_unknown_category() {
        let zero = Args::try_parse_from(["expenses", "add", "--amount", "0", "--category", "fun"]);
        assert!(zero.is_err());
        let rent = Args::try_parse_from(["expenses", "add", "--amount", "5", "--category", "rent"]);
        assert!(rent.is_err());
    }

    #[test]
    fn test_parse_range() {
        let args = Args::try_parse_from([
            "expenses", "summary", "--user", "mo", "--from", "2024-01-01", "--to", "2024-01-31",
        ])
        .unwrap();
        let Command::Summary(range) = args.command() else {
            panic!("expected summary");
        };
        assert_eq!(range.user.as_deref(), Some("mo"));
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 1, 1));
    }
}
