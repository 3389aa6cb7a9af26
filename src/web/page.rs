//! HTML rendering for the web UI. Every page inlines the stylesheet loaded at startup.

use crate::model::{money, Category, DATE_FORMAT};
use crate::report::Summary;
use crate::utils::html_escape;
use crate::web::chart;
use std::fmt::Write;

const TITLE: &str = "Mini Expense Tracker 💸";
pub(crate) const USER_PROMPT: &str = "Please enter a username in the sidebar to continue.";
pub(crate) const NOTHING_TO_CHART: &str = "No expenses to chart in this date range. Add one!";
pub(crate) const ADDED: &str = "✨ Added! Be mindful with your expenses!✨";

/// What every page needs to know about the request it answers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageContext<'a> {
    pub stylesheet: &'a str,
    pub currency: &'a str,
    pub multi_user: bool,
    pub user: Option<&'a str>,
}

impl PageContext<'_> {
    fn user_attr(&self) -> String {
        html_escape(self.user.unwrap_or_default())
    }

    /// A hidden form field carrying the username, empty in single-user mode.
    fn hidden_user(&self) -> String {
        match self.user {
            Some(_) if self.multi_user => format!(
                r#"<input type="hidden" name="user" value="{}">"#,
                self.user_attr()
            ),
            _ => String::new(),
        }
    }
}

fn layout(ctx: &PageContext<'_>, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n<main>\n{body}\n\
         </main>\n</body>\n</html>\n",
        ctx.stylesheet,
        sidebar(ctx)
    )
}

fn sidebar(ctx: &PageContext<'_>) -> String {
    if !ctx.multi_user {
        return "<aside class=\"sidebar\"><h2>🔐 Welcome!</h2>\
                <p>All expenses go into one shared log.</p></aside>"
            .to_string();
    }
    format!(
        r#"<aside class="sidebar"><h2>🔐 Welcome!</h2>
<form method="get" action="/">
<label for="user">Enter your username</label>
<input id="user" name="user" maxlength="20" value="{}">
<button type="submit">Go</button>
</form></aside>"#,
        ctx.user_attr()
    )
}

fn notice(kind: &str, message: &str) -> String {
    format!(
        r#"<div class="notice {kind}">{}</div>"#,
        html_escape(message)
    )
}

/// The page shown in multi-user mode before a username is given.
pub(crate) fn prompt(ctx: &PageContext<'_>) -> String {
    layout(ctx, &notice("warning", USER_PROMPT))
}

/// A page showing only a message, for 4xx and 5xx responses.
pub(crate) fn message(ctx: &PageContext<'_>, heading: &str, text: &str) -> String {
    let body = format!("<h1>{}</h1>\n{}", html_escape(heading), notice("error", text));
    layout(ctx, &body)
}

/// The main page: the add form, the date filter, the total, the chart and the tables.
pub(crate) fn dashboard(ctx: &PageContext<'_>, summary: &Summary, added: bool) -> String {
    let mut b = String::from(
        "<h1>✨ Mini Expense Tracker ✨</h1>\n\
         <p class=\"caption\">track your little spends in style!💳</p>\n",
    );
    if added {
        b.push_str(&notice("success", ADDED));
    }
    b.push_str(&expense_form(ctx));

    let _ = write!(
        b,
        r#"<h2>📅 Filter by Date Range</h2>
<form method="get" action="/" class="range">{}
<label>From <input type="date" name="from" value="{}"></label>
<label>To <input type="date" name="to" value="{}"></label>
<button type="submit">Apply</button>
</form>
"#,
        ctx.hidden_user(),
        summary.range.from(),
        summary.range.to()
    );

    let _ = writeln!(
        b,
        r#"<div class="total">Total Spent: {}</div>"#,
        html_escape(&money(summary.total, ctx.currency))
    );

    match &summary.pie {
        Some(slices) => {
            let _ = writeln!(b, r#"<div class="chart">{}</div>"#, chart::pie_svg(slices));
        }
        None => b.push_str(&notice("info", NOTHING_TO_CHART)),
    }

    b.push_str(&records_table(ctx, summary));
    b.push_str(&monthly_table(ctx, summary));
    layout(ctx, &b)
}

fn expense_form(ctx: &PageContext<'_>) -> String {
    let mut options = String::new();
    for c in Category::ALL {
        let label = html_escape(&c.to_string());
        let _ = write!(options, r#"<option value="{label}">{label}</option>"#);
    }
    format!(
        r#"<form method="post" action="/expenses" class="expense">{}
<label>Amount ({}) <input type="number" name="amount" min="1" step="any" value="1" required></label>
<label>Category <select name="category">{options}</select></label>
<label class="wide">Note / Emoji (optional) <input name="note"></label>
<button type="submit" class="wide">➕ Add Expense</button>
</form>
"#,
        ctx.hidden_user(),
        html_escape(ctx.currency)
    )
}

fn export_href(ctx: &PageContext<'_>, summary: &Summary) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let (true, Some(user)) = (ctx.multi_user, ctx.user) {
        query.append_pair("user", user);
    }
    query
        .append_pair("from", &summary.range.from().to_string())
        .append_pair("to", &summary.range.to().to_string());
    format!("/export?{}", query.finish())
}

fn records_table(ctx: &PageContext<'_>, summary: &Summary) -> String {
    let mut rows = String::new();
    for r in &summary.records {
        let _ = writeln!(
            rows,
            r#"<tr><td>{}</td><td class="amount">{}</td><td>{}</td><td>{}</td></tr>"#,
            r.date().format(DATE_FORMAT),
            html_escape(&money(r.amount().value(), ctx.currency)),
            html_escape(&r.category().to_string()),
            html_escape(r.note())
        );
    }
    format!(
        r#"<details>
<summary>📜 View all expenses</summary>
<table>
<thead><tr><th>Date</th><th>Amount</th><th>Category</th><th>Note</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<a class="button" href="{}" download>📂 Export CSV</a>
</details>
"#,
        html_escape(&export_href(ctx, summary))
    )
}

fn monthly_table(ctx: &PageContext<'_>, summary: &Summary) -> String {
    let Some(top) = &summary.monthly_top else {
        return String::new();
    };
    let mut rows = String::new();
    for t in top {
        let _ = writeln!(
            rows,
            r#"<tr><td>{}</td><td>{}</td><td class="amount">{}</td></tr>"#,
            t.month,
            html_escape(&t.category.to_string()),
            html_escape(&money(t.amount, ctx.currency))
        );
    }
    format!(
        r#"<details>
<summary>📊 Top Spending Category Each Month</summary>
<table>
<thead><tr><th>Month</th><th>Category</th><th>Amount</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</details>
"#
    )
}
