//! The web UI: an axum router that renders the dashboard, accepts the add-expense form and serves
//! CSV downloads.
//!
//! Every request runs one interaction against the selected store through the same path the CLI
//! uses, so the web UI and the CLI share locking, validation and error types.

mod chart;
mod page;

use crate::app::{Action, NewExpense, Render};
use crate::commands;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Category};
use crate::{store, Config, Error, Result};
use anyhow::{anyhow, Context};
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use page::PageContext;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const CSV: &str = "text/csv; charset=utf-8";
const GENERIC_FAILURE: &str = "The request could not be completed. The details are in the log.";

/// Shared by every request: the configuration (and with it the store registry), the stylesheet
/// that is inlined into every page and the clock that stamps new expenses.
#[derive(Debug)]
pub(crate) struct AppState {
    config: Config,
    stylesheet: String,
    clock: fn() -> NaiveDateTime,
}

type Shared = Arc<AppState>;

impl AppState {
    pub(crate) fn new(config: Config, stylesheet: String) -> Self {
        Self {
            config,
            stylesheet,
            clock: commands::now,
        }
    }

    fn context<'a>(&'a self, user: Option<&'a str>) -> PageContext<'a> {
        PageContext {
            stylesheet: &self.stylesheet,
            currency: self.config.currency(),
            multi_user: self.config.multi_user(),
            user,
        }
    }

    /// The username to use for a request. In single-user mode any `user` parameter is ignored.
    fn user<'a>(&self, user: Option<&'a str>) -> Option<&'a str> {
        if self.config.multi_user() {
            user
        } else {
            None
        }
    }

    /// Logs the full error and renders a page that shows no file paths.
    fn error_page(&self, e: &Error) -> Response {
        let (status, heading, text) = match e.error_type() {
            ErrorType::Request => {
                warn!("{e}");
                (
                    StatusCode::BAD_REQUEST,
                    "That didn't work",
                    e.inner().to_string(),
                )
            }
            ErrorType::Parse => {
                error!("{e}");
                let text = store::schema_detail(e.inner())
                    .map(|d| format!("The expense log could not be read: {d}"))
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong", text)
            }
            _ => {
                error!("{e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    GENERIC_FAILURE.to_string(),
                )
            }
        };
        let page = page::message(&self.context(None), heading, &text);
        (status, Html(page)).into_response()
    }

    fn finish(&self, route: &str, result: Result<Response>) -> Response {
        let response = result.unwrap_or_else(|e| self.error_page(&e));
        info!("{route} {}", response.status());
        response
    }
}

/// Builds the router for the web UI.
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/expenses", post(add))
        .route("/export", get(export))
        .fallback(not_found)
        .with_state(Arc::new(state))
}

/// Listens on `addr` and serves the web UI until the process is stopped.
pub(crate) async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    info!(
        "Serving the expense tracker on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, router(state))
        .await
        .context("The web server stopped unexpectedly")
}

/// Query parameters of the dashboard and the CSV export.
#[derive(Debug, Default, Deserialize)]
struct RangeParams {
    #[serde(default, deserialize_with = "blank_as_none")]
    user: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    added: Option<String>,
}

/// The add-expense form. Amount and category are parsed by hand so a bad value gets a message
/// naming the field.
#[derive(Debug, Default, Deserialize)]
struct AddForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    user: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    amount: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    category: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    note: Option<String>,
}

/// Trims a url-encoded value and treats a blank one as absent.
fn blank_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn rejected(text: String) -> Error {
    Error::new(ErrorType::Request, anyhow!(text))
}

async fn dashboard(
    State(state): State<Shared>,
    query: std::result::Result<Query<RangeParams>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(params)) => dashboard_page(&state, params).await,
        Err(e) => Err(rejected(e.body_text())),
    };
    state.finish("GET /", result)
}

async fn dashboard_page(state: &AppState, params: RangeParams) -> Result<Response> {
    let user = state.user(params.user.as_deref());
    if state.config.multi_user() && user.is_none() {
        return Ok(Html(page::prompt(&state.context(None))).into_response());
    }
    let action = Action::View {
        from: params.from,
        to: params.to,
    };
    match commands::run(&state.config, user, action, (state.clock)()).await? {
        Render::Dashboard(summary) => {
            let added = params.added.as_deref() == Some("1");
            let body = page::dashboard(&state.context(user), &summary, added);
            Ok(Html(body).into_response())
        }
        other => Err(unexpected(other)),
    }
}

async fn add(
    State(state): State<Shared>,
    form: std::result::Result<Form<AddForm>, FormRejection>,
) -> Response {
    let result = match form {
        Ok(Form(form)) => add_expense(&state, form).await,
        Err(e) => Err(rejected(e.body_text())),
    };
    state.finish("POST /expenses", result)
}

async fn add_expense(state: &AppState, form: AddForm) -> Result<Response> {
    let user = state.user(form.user.as_deref());
    let amount = form
        .amount
        .as_deref()
        .context("An amount is required")
        .and_then(|s| Amount::from_str(s).map_err(|e| anyhow!("Invalid amount '{s}': {e}")))
        .pub_result(ErrorType::Request)?;
    let category = form
        .category
        .as_deref()
        .context("A category is required")
        .and_then(|s| Category::from_str(s).map_err(|_| anyhow!("Unknown category '{s}'")))
        .pub_result(ErrorType::Request)?;
    let now = (state.clock)();
    let action = Action::Add(NewExpense {
        amount,
        category,
        note: form.note.unwrap_or_default(),
        at: now,
    });
    match commands::run(&state.config, user, action, now).await? {
        Render::Added(_) => {
            let mut location = url::form_urlencoded::Serializer::new(String::new());
            if let Some(user) = user {
                location.append_pair("user", user);
            }
            location.append_pair("added", "1");
            Ok(Redirect::to(&format!("/?{}", location.finish())).into_response())
        }
        other => Err(unexpected(other)),
    }
}

async fn export(
    State(state): State<Shared>,
    query: std::result::Result<Query<RangeParams>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(params)) => export_csv(&state, params).await,
        Err(e) => Err(rejected(e.body_text())),
    };
    state.finish("GET /export", result)
}

async fn export_csv(state: &AppState, params: RangeParams) -> Result<Response> {
    let action = Action::Export {
        from: params.from,
        to: params.to,
    };
    let user = state.user(params.user.as_deref());
    match commands::run(&state.config, user, action, (state.clock)()).await? {
        Render::Csv { file_name, body } => {
            let disposition = format!("attachment; filename=\"{}\"", header_safe(&file_name));
            let disposition = HeaderValue::from_str(&disposition)
                .context("Unable to build the download header")
                .pub_result(ErrorType::Service)?;
            let headers = [
                (CONTENT_TYPE, HeaderValue::from_static(CSV)),
                (CONTENT_DISPOSITION, disposition),
            ];
            Ok((headers, body).into_response())
        }
        other => Err(unexpected(other)),
    }
}

async fn not_found(State(state): State<Shared>, method: Method, uri: Uri) -> Response {
    let page = page::message(
        &state.context(None),
        "Not found",
        &format!("There is nothing at {}", uri.path()),
    );
    let response = (StatusCode::NOT_FOUND, Html(page)).into_response();
    state.finish(&format!("{method} {}", uri.path()), Ok(response))
}

fn unexpected(render: Render) -> Error {
    Error::new(ErrorType::Service, anyhow!("Unexpected render: {render:?}"))
}

/// Replaces anything that cannot appear in a quoted header parameter.
fn header_safe(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
