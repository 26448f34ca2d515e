use serde::Deserialize;

/// Position of the whole-week figure in a per-day amount array
/// (Monday..Sunday, then the total).
pub const WEEK_TOTAL_INDEX: usize = 7;

/// Body of the weekly report endpoint. Only the fields read by the widgets
/// are modelled; everything else in the payload is ignored. An explicit
/// `null` is treated like a missing field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeeklyReport {
    #[serde(default)]
    pub total_billable: Option<f64>,
    #[serde(default)]
    pub week_totals: Option<Vec<WeekTotal>>,
}

/// `week_totals` holds bare per-day durations in `time` mode and one
/// entry per currency in `earnings` mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WeekTotal {
    Currency(CurrencyAmounts),
    Duration(Option<f64>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrencyAmounts {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub amount: Option<Vec<Option<f64>>>,
}

/// Error payload sent alongside a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl WeeklyReport {
    /// Billable milliseconds, zero when the API reports nothing.
    pub fn billable_ms(&self) -> f64 {
        self.total_billable.unwrap_or(0.0)
    }

    /// Week total of the first currency, zero when absent or null.
    pub fn week_earnings(&self) -> f64 {
        let first = self.week_totals.as_deref().and_then(|totals| totals.first());
        match first {
            Some(WeekTotal::Currency(amounts)) => amounts
                .amount
                .as_deref()
                .and_then(|amount| amount.get(WEEK_TOTAL_INDEX))
                .copied()
                .flatten()
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }
}
