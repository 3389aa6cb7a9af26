//! Read-only commands that show the contents of a store.

use crate::app::{Action, Render};
use crate::args::RangeArgs;
use crate::commands::{now, run, Out};
use crate::model::{money, Record, DATE_FORMAT};
use crate::report::Summary;
use crate::{Config, Result};
use std::fmt::Write;

/// Lists the expenses within the range, most recent first.
pub async fn list(config: Config, args: RangeArgs) -> Result<Out<Vec<Record>>> {
    let summary = dashboard(&config, &args).await?;
    let currency = config.currency();
    let mut message = format!(
        "Expenses from {} to {}",
        summary.range.from(),
        summary.range.to()
    );
    if summary.records.is_empty() {
        message.push_str("\nNo expenses in this date range. Add one!");
    }
    for r in &summary.records {
        let _ = write!(
            message,
            "\n  {}  {:>12}  {:<12}  {}",
            r.date().format(DATE_FORMAT),
            money(r.amount().value(), currency),
            r.category().to_string(),
            r.note()
        );
    }
    Ok(Out::new(message, summary.records))
}

/// Shows the total, the per-category breakdown and the top category of each month.
pub async fn summary(config: Config, args: RangeArgs) -> Result<Out<Summary>> {
    let summary = dashboard(&config, &args).await?;
    let message = render_text(&summary, config.currency());
    Ok(Out::new(message, summary))
}

async fn dashboard(config: &Config, args: &RangeArgs) -> Result<Summary> {
    let action = Action::View {
        from: args.from,
        to: args.to,
    };
    match run(config, args.user.as_deref(), action, now()).await? {
        Render::Dashboard(summary) => Ok(*summary),
        other => Err(anyhow::anyhow!("Unexpected result from view: {other:?}").into()),
    }
}

fn render_text(summary: &Summary, currency: &str) -> String {
    let mut s = format!(
        "Expenses from {} to {}\nTotal Spent: {}",
        summary.range.from(),
        summary.range.to(),
        money(summary.total, currency)
    );
    if summary.by_category.is_empty() {
        s.push_str("\nNo expenses to chart in this date range. Add one!");
    }
    for c in &summary.by_category {
        let pct = c
            .percent
            .map(|p| format!("{}%", p.round()))
            .unwrap_or_default();
        let _ = write!(
            s,
            "\n  {:<12}  {:>12}  {:>4}",
            c.category.to_string(),
            money(c.amount, currency),
            pct
        );
    }
    if let Some(top) = &summary.monthly_top {
        s.push_str("\nTop Spending Category Each Month");
        for t in top {
            let _ = write!(
                s,
                "\n  {}  {:<12}  {:>12}",
                t.month,
                t.category.to_string(),
                money(t.amount, currency)
            );
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn january(user: Option<&str>) -> RangeArgs {
        RangeArgs {
            user: user.map(str::to_string),
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 31),
        }
    }

    #[tokio::test]
    async fn test_summary_scenario() {
        let env = TestEnv::new().await;
        env.insert_scenario(None).await;

        let out = summary(env.config(), RangeArgs::default()).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.total, Decimal::from(180));
        assert_eq!(s.by_category.len(), 2);
        assert!(out.message().contains("Total Spent: ₹180.00"));
        assert!(out.message().contains("2024-02  🍜 Food"));

        let out = summary(env.config(), january(None)).await.unwrap();
        assert_eq!(out.structure().unwrap().total, Decimal::from(150));
        assert!(out.message().contains("Expenses from 2024-01-01 to 2024-01-31"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let env = TestEnv::multi_user().await;
        env.insert_scenario(Some("lee")).await;
        let out = list(env.config(), january(Some("lee"))).await.unwrap();
        let records = out.structure().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].date() > records[1].date());

        // Another user's store is separate and starts empty
        let out = list(env.config(), january(Some("max"))).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
        assert!(out.message().contains("No expenses"));
    }

    #[tokio::test]
    async fn test_summary_of_empty_store() {
        let env = TestEnv::new().await;
        let out = summary(env.config(), RangeArgs::default()).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.total, Decimal::ZERO);
        assert!(s.monthly_top.is_none());
        assert!(out.message().contains("No expenses to chart"));
    }
}
