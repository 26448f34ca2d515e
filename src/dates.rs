use chrono::{Datelike, Duration, NaiveDate};

/// Monday-to-Sunday calendar week, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl WeekWindow {
    pub fn containing(date: NaiveDate) -> Self {
        let start = first_day_of_week(date);
        let end = start + Duration::days(6);
        Self { start, end }
    }

    /// The week holding the day seven days before this window's start.
    pub fn previous(&self) -> Self {
        Self::containing(self.start - Duration::days(7))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

// Week starts Monday.
pub fn first_day_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}
