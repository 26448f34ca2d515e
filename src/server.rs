use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::dates::WeekWindow;
use crate::toggl::{ReportClient, TogglError};
use crate::units::ms_to_hours;
use crate::widget::{POUND_PREFIX, WidgetContent, WidgetItem, widget_content};

pub const TOGGLR_UPSTREAM_SERVER: &str = "TOGGLR_UPSTREAM_SERVER";
pub const TOGGLR_UPSTREAM_NETWORK: &str = "TOGGLR_UPSTREAM_NETWORK";
pub const TOGGLR_UPSTREAM_DECODE: &str = "TOGGLR_UPSTREAM_DECODE";
pub const TOGGLR_INTERNAL: &str = "TOGGLR_INTERNAL";

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub reports: ReportClient,
    pub today: Clock,
}

impl AppState {
    pub fn new(reports: ReportClient) -> Self {
        Self {
            reports,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.today = Arc::new(move || date);
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(billable_hours))
        .route("/resources-week", get(resources_invested))
        .route("/revenue-week", get(resources_invested))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn billable_hours(State(state): State<AppState>) -> Result<Json<WidgetContent>, ApiError> {
    let (this_week, last_week) = this_and_last_week(&state, ReportClient::billable).await?;
    let items = vec![
        WidgetItem::new(ms_to_hours(this_week)),
        WidgetItem::new(ms_to_hours(last_week)),
    ];
    Ok(Json(widget_content(items)))
}

async fn resources_invested(
    State(state): State<AppState>,
) -> Result<Json<WidgetContent>, ApiError> {
    let (this_week, last_week) = this_and_last_week(&state, ReportClient::earnings).await?;
    let items = vec![
        WidgetItem::new(this_week).with_prefix(POUND_PREFIX),
        WidgetItem::new(last_week).with_prefix(POUND_PREFIX),
    ];
    Ok(Json(widget_content(items)))
}

/// Runs `metric` for the current week, then for the one before it, off the
/// async executor. The first failure aborts both.
async fn this_and_last_week<F>(state: &AppState, metric: F) -> Result<(f64, f64), ApiError>
where
    F: Fn(&ReportClient, NaiveDate) -> Result<f64, TogglError> + Send + 'static,
{
    let today = (state.today)();
    let last_week = WeekWindow::containing(today).previous().start();
    let reports = state.reports.clone();

    let result = tokio::task::spawn_blocking(move || {
        let this_week = metric(&reports, today)?;
        let last_week = metric(&reports, last_week)?;
        Ok::<_, TogglError>((this_week, last_week))
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))?;

    result.map_err(ApiError::Upstream)
}

#[derive(Debug)]
pub enum ApiError {
    Upstream(TogglError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream(err) => {
                warn!(error = %err, "weekly report request failed");
                let code = match err {
                    TogglError::Server(_) => TOGGLR_UPSTREAM_SERVER,
                    TogglError::Network(_) => TOGGLR_UPSTREAM_NETWORK,
                    TogglError::Decode(_) => TOGGLR_UPSTREAM_DECODE,
                };
                problem(StatusCode::BAD_GATEWAY, code, Some(err.to_string()))
            }
            ApiError::Internal(message) => {
                error!(error = %message, "report task failed");
                problem(StatusCode::INTERNAL_SERVER_ERROR, TOGGLR_INTERNAL, None)
            }
        }
    }
}

/// RFC 7807 Problem Details payload.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub code: String,
}

pub fn problem(status: StatusCode, code: &str, detail: Option<String>) -> Response {
    let payload = ProblemDetails {
        r#type: "about:blank".to_string(),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        status: status.as_u16(),
        detail,
        code: code.to_string(),
    };

    let mut response = (status, Json(payload)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    response
}
