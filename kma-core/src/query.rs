//! Query parameters for the two supported endpoints.
//!
//! Dates and times travel as the provider's own zero-padded strings
//! (`"20210225"`, `"0500"`, `"23"`). The chrono constructors are the safe way
//! to produce them.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

pub const DATE_FORMAT: &str = "%Y%m%d";

/// Hours at which the short-term forecast is issued.
pub const FORECAST_ISSUE_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

/// Minutes after the issue hour before a forecast is available.
pub const FORECAST_PUBLISH_DELAY_MINUTES: i64 = 10;

/// Hourly ASOS observations for one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationQuery {
    pub station_id: String,
    pub start_date: String,
    pub start_hour: String,
    pub end_date: String,
    pub end_hour: String,
    pub num_of_rows: u32,
}

impl ObservationQuery {
    pub const DEFAULT_ROWS: u32 = 24;

    pub fn new(
        station_id: impl Into<String>,
        start_date: impl Into<String>,
        start_hour: impl Into<String>,
        end_date: impl Into<String>,
        end_hour: impl Into<String>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            start_date: start_date.into(),
            start_hour: start_hour.into(),
            end_date: end_date.into(),
            end_hour: end_hour.into(),
            num_of_rows: Self::DEFAULT_ROWS,
        }
    }

    /// Observations from `start` to `end`, both truncated to the hour.
    pub fn between(station_id: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(
            station_id,
            start.format(DATE_FORMAT).to_string(),
            format!("{:02}", start.hour()),
            end.format(DATE_FORMAT).to_string(),
            format!("{:02}", end.hour()),
        )
    }

    pub fn with_rows(mut self, num_of_rows: u32) -> Self {
        self.num_of_rows = num_of_rows;
        self
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pageNo", "1".to_string()),
            ("numOfRows", self.num_of_rows.to_string()),
            ("dataType", "JSON".to_string()),
            ("dataCd", "ASOS".to_string()),
            ("dateCd", "HR".to_string()),
            ("startDt", self.start_date.clone()),
            ("startHh", self.start_hour.clone()),
            ("endDt", self.end_date.clone()),
            ("endHh", self.end_hour.clone()),
            ("stnIds", self.station_id.clone()),
        ]
    }
}

/// Short-term (village) forecast for one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub base_date: String,
    pub base_time: String,
    pub nx: String,
    pub ny: String,
    pub num_of_rows: u32,
}

impl ForecastQuery {
    pub const DEFAULT_ROWS: u32 = 300;

    pub fn new(
        base_date: impl Into<String>,
        base_time: impl Into<String>,
        nx: impl Into<String>,
        ny: impl Into<String>,
    ) -> Self {
        Self {
            base_date: base_date.into(),
            base_time: base_time.into(),
            nx: nx.into(),
            ny: ny.into(),
            num_of_rows: Self::DEFAULT_ROWS,
        }
    }

    pub fn at(base: NaiveDateTime, nx: impl Into<String>, ny: impl Into<String>) -> Self {
        Self::new(
            base.format(DATE_FORMAT).to_string(),
            base.format("%H%M").to_string(),
            nx,
            ny,
        )
    }

    /// The most recent forecast already published at local time `now`.
    pub fn latest(now: NaiveDateTime, nx: impl Into<String>, ny: impl Into<String>) -> Self {
        Self::at(latest_issue(now), nx, ny)
    }

    pub fn with_rows(mut self, num_of_rows: u32) -> Self {
        self.num_of_rows = num_of_rows;
        self
    }

    /// `base_date ++ base_time`, the value of every row's `DT_base`.
    pub fn dt_base(&self) -> String {
        format!("{}{}", self.base_date, self.base_time)
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pageNo", "1".to_string()),
            ("numOfRows", self.num_of_rows.to_string()),
            ("dataType", "JSON".to_string()),
            ("base_date", self.base_date.clone()),
            ("base_time", self.base_time.clone()),
            ("nx", self.nx.clone()),
            ("ny", self.ny.clone()),
        ]
    }
}

fn latest_issue(now: NaiveDateTime) -> NaiveDateTime {
    let published = now - Duration::minutes(FORECAST_PUBLISH_DELAY_MINUTES);

    let issue_hour = FORECAST_ISSUE_HOURS
        .iter()
        .rev()
        .find(|&&h| h <= published.hour())
        .copied();

    match issue_hour {
        Some(hour) => published.date().and_time(hour_time(hour)),
        // before 02:10 the latest run is 23:00 of the previous day
        None => (published.date() - Duration::days(1)).and_time(hour_time(23)),
    }
}

fn hour_time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}
