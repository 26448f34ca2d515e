use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use reqwest::blocking::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::dates::{WeekWindow, format_date};
use crate::models::{ErrorBody, WeeklyReport};

pub const WEEKLY_REPORT_URL: &str = "https://toggl.com/reports/api/v2/weekly";
/// Sent as the `user_agent` query parameter the reports API asks for.
pub const REPORT_USER_AGENT: &str = "testing";
const BASIC_AUTH_PASSWORD: &str = "api_token";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TogglError {
    /// Non-2xx answer; the message is `"<status>. <message>. <tip>"` or
    /// `"<status>. <reason>"`.
    #[error("{0}")]
    Server(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid report payload: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculate {
    Time,
    Earnings,
}

impl Calculate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Calculate::Time => "time",
            Calculate::Earnings => "earnings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    workspace_id: String,
    window: WeekWindow,
    calculate: Calculate,
    api_token: String,
}

impl ReportRequest {
    /// Request for the calendar week containing `date`.
    pub fn weekly(settings: &Settings, date: NaiveDate, calculate: Calculate) -> Self {
        Self {
            workspace_id: settings.workspace_id().to_string(),
            window: WeekWindow::containing(date),
            calculate,
            api_token: settings.api_token().to_string(),
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn since(&self) -> NaiveDate {
        self.window.start()
    }

    pub fn until(&self) -> NaiveDate {
        self.window.end()
    }

    pub fn calculate(&self) -> Calculate {
        self.calculate
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("workspace_id", self.workspace_id.clone()),
            ("since", format_date(self.since())),
            ("until", format_date(self.until())),
            ("user_agent", REPORT_USER_AGENT.to_string()),
            ("calculate", self.calculate.as_str().to_string()),
        ]
    }

    /// HTTP Basic credentials: the token is the user name, the password is
    /// the literal `api_token`.
    pub fn authorization(&self) -> String {
        let credentials = STANDARD.encode(format!("{}:{}", self.api_token, BASIC_AUTH_PASSWORD));
        format!("Basic {}", credentials)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one report request and hands back whatever came over the wire.
pub trait Transport: Send + Sync {
    fn send(&self, request: &ReportRequest) -> Result<RawResponse, TogglError>;
}

pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TogglError> {
        let client = Client::builder()
            .user_agent(concat!("togglr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TogglError::Network(err.to_string()))?;
        Ok(Self {
            client,
            url: WEEKLY_REPORT_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ReportRequest) -> Result<RawResponse, TogglError> {
        let url = reqwest::Url::parse_with_params(&self.url, request.query())
            .map_err(|err| TogglError::Network(err.to_string()))?;
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .header("Authorization", request.authorization())
            .send()
            .map_err(|err| TogglError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|err| TogglError::Network(err.to_string()))?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[derive(Clone)]
pub struct ReportClient {
    settings: Settings,
    transport: Arc<dyn Transport>,
}

impl ReportClient {
    pub fn new(settings: Settings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn fetch_report(
        &self,
        date: NaiveDate,
        calculate: Calculate,
    ) -> Result<WeeklyReport, TogglError> {
        let request = ReportRequest::weekly(&self.settings, date, calculate);
        debug!(
            workspace_id = request.workspace_id(),
            since = %request.since(),
            until = %request.until(),
            calculate = calculate.as_str(),
            "fetching weekly report"
        );

        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(TogglError::Server(server_error_message(&response)));
        }

        serde_json::from_str(&response.body).map_err(|err| TogglError::Decode(err.to_string()))
    }

    /// Billable milliseconds for the week containing `date`.
    pub fn billable(&self, date: NaiveDate) -> Result<f64, TogglError> {
        Ok(self.fetch_report(date, Calculate::Time)?.billable_ms())
    }

    /// Earnings for the week containing `date`, first currency only.
    pub fn earnings(&self, date: NaiveDate) -> Result<f64, TogglError> {
        Ok(self.fetch_report(date, Calculate::Earnings)?.week_earnings())
    }
}

fn server_error_message(response: &RawResponse) -> String {
    let error = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.error);
    let details: Vec<String> = error
        .into_iter()
        .flat_map(|error| [error.message, error.tip])
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

    if details.is_empty() {
        format!("{}. {}", response.status, response.reason)
    } else {
        format!("{}. {}", response.status, details.join(". "))
    }
}
