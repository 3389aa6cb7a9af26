//! The interaction model: one user action applied to one snapshot of a store.
//!
//! [`step`] is pure. It takes the records as they were loaded and an [`Action`], and returns the
//! new snapshot, the record to persist (if any) and what to render. [`interact`] is the thin shell
//! around it that does the IO: load the store, run `step`, append the record.

use crate::model::{Amount, Category, Record, Records};
use crate::report::{DateRange, Summary};
use crate::store::{self, Owner, Stores};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

/// The contents of one owner's store at the start of an interaction.
#[derive(Debug, Clone)]
pub struct Snapshot {
    owner: Owner,
    records: Records,
}

impl Snapshot {
    pub fn new(owner: Owner, records: Records) -> Self {
        Self { owner, records }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn records(&self) -> &Records {
        &self.records
    }
}

/// An expense as entered on the form, before it becomes a `Record`.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Amount,
    pub category: Category,
    pub note: String,
    /// When the expense was logged. Only minutes are kept.
    pub at: NaiveDateTime,
}

/// Something the user asked for.
#[derive(Debug, Clone)]
pub enum Action {
    /// Show the dashboard. Missing bounds default to the span of the store.
    View {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Log a new expense.
    Add(NewExpense),
    /// Download the records within a range as CSV.
    Export {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

/// What the presentation layer should show as a result of an action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Render {
    Dashboard(Box<Summary>),
    Added(Record),
    Csv { file_name: String, body: String },
}

/// The result of applying an `Action` to a `Snapshot`.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub snapshot: Snapshot,
    /// A record that must be appended to the store before the render is shown.
    pub persist: Option<Record>,
    pub render: Render,
}

/// Applies `action` to `snapshot`. `today` supplies the default date range for an empty store.
pub fn step(
    snapshot: Snapshot,
    action: Action,
    today: NaiveDate,
    currency: &str,
) -> Result<Outcome> {
    match action {
        Action::View { from, to } => {
            let range = DateRange::with_defaults(from, to, snapshot.records(), today);
            let summary = Summary::new(snapshot.records(), range, currency);
            Ok(Outcome {
                snapshot,
                persist: None,
                render: Render::Dashboard(Box::new(summary)),
            })
        }
        Action::Add(expense) => {
            let record = Record::new(expense.at, expense.amount, expense.category, expense.note);
            let mut snapshot = snapshot;
            snapshot.records.push(record.clone());
            Ok(Outcome {
                snapshot,
                persist: Some(record.clone()),
                render: Render::Added(record),
            })
        }
        Action::Export { from, to } => {
            let range = DateRange::with_defaults(from, to, snapshot.records(), today);
            let filtered = crate::report::filter_by_date_range(snapshot.records(), range);
            let body = store::to_csv(&filtered)?;
            let file_name = snapshot.owner().export_file_name();
            Ok(Outcome {
                snapshot,
                persist: None,
                render: Render::Csv { file_name, body },
            })
        }
    }
}

/// Loads `owner`'s store, applies `action`, persists any new record and returns the render.
pub async fn interact(
    stores: &Stores,
    owner: Owner,
    action: Action,
    now: NaiveDateTime,
    currency: &str,
) -> Result<Render> {
    let store = stores.open(&owner).await?;
    let records = store.load_all().await?;
    debug!("Loaded {} records for {owner}", records.len());
    let outcome = step(Snapshot::new(owner, records), action, now.date(), currency)?;
    if let Some(record) = &outcome.persist {
        store.append(record).await?;
        info!(
            "Added {} {} for {}",
            record.amount(),
            record.category(),
            outcome.snapshot.owner()
        );
    }
    Ok(outcome.render)
}
