use crate::app::{Action, Render};
use crate::args::ExportArgs;
use crate::commands::{now, run, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Result};
use std::path::PathBuf;

/// Writes the expenses within the range to a CSV file with the store's header.
///
/// The file goes to `args.out`, or to `<user>_expenses.csv` in the current directory.
pub async fn export(config: Config, args: ExportArgs) -> Result<Out<PathBuf>> {
    let action = Action::Export {
        from: args.range.from,
        to: args.range.to,
    };
    let (file_name, body) = match run(&config, args.range.user.as_deref(), action, now()).await? {
        Render::Csv { file_name, body } => (file_name, body),
        other => {
            return Err(anyhow::anyhow!("Unexpected result from export: {other:?}").into())
        }
    };
    let path = args.out.unwrap_or_else(|| PathBuf::from(file_name));
    utils::write(&path, &body).await.pub_result(ErrorType::Store)?;
    let rows = body.lines().count().saturating_sub(1);
    Ok(Out::new(
        format!("Exported {rows} expenses to {}", path.display()),
        path,
    ))
}
