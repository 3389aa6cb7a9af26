use crate::app::{Action, NewExpense, Render};
use crate::args::AddArgs;
use crate::commands::{now, run, Out};
use crate::model::{money, Record};
use crate::{Config, Result};

/// Appends a new expense to the store.
///
/// The expense is stamped with `args.at`, or with the current local time when that is not given.
///
/// # Errors
///
/// - Returns a request error if a username is missing in multi-user mode, or given in
///   single-user mode.
/// - Returns a parse error if the existing store file does not match the schema. Nothing is
///   written in that case.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Record>> {
    let action = Action::Add(NewExpense {
        amount: args.amount,
        category: args.category,
        note: args.note.unwrap_or_default(),
        at: args.at.unwrap_or_else(now),
    });
    match run(&config, args.user.as_deref(), action, now()).await? {
        Render::Added(record) => {
            let message = format!(
                "Added {} for {}. Be mindful with your expenses!",
                money(record.amount().value(), config.currency()),
                record.category()
            );
            Ok(Out::new(message, record))
        }
        other => Err(anyhow::anyhow!("Unexpected result from add: {other:?}").into()),
    }
}
