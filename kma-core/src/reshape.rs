//! Records to tables.
//!
//! Observations tabulate as-is. Forecasts arrive one value per
//! (timestamp, category) and are pivoted into one row per forecast
//! timestamp with a column per category.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::ops::Deref;

use serde::Serialize;

use crate::{
    envelope::Record,
    error::{KmaError, Result},
    query::ForecastQuery,
    table::{Row, Table},
};

pub const DT_BASE: &str = "DT_base";
pub const DT_FCST: &str = "DT_fcst";
pub const NX: &str = "NX";
pub const NY: &str = "NY";

/// One row per record, columns in first-seen order.
pub fn to_table(records: &[Record]) -> Table {
    let mut seen = HashSet::new();
    let columns: Vec<String> = records
        .iter()
        .flat_map(|r| r.names())
        .filter(|name| seen.insert(*name))
        .map(str::to_owned)
        .collect();

    let mut table = Table::new(columns);
    for record in records {
        let cells = table
            .columns()
            .iter()
            .map(|c| record.get(c).map(str::to_owned))
            .collect();
        table.push_row(cells);
    }
    table
}

/// A single forecast value as the provider sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRecord {
    pub base_date: Option<String>,
    pub base_time: Option<String>,
    pub fcst_date: String,
    pub fcst_time: String,
    pub category: String,
    pub fcst_value: String,
    pub nx: Option<String>,
    pub ny: Option<String>,
}

impl ForecastRecord {
    /// `index` is the record's position in the response, used in errors.
    pub fn from_record(index: usize, record: &Record) -> Result<Self> {
        let required = |field: &'static str| {
            record
                .get(field)
                .map(str::to_owned)
                .ok_or(KmaError::MalformedRecord { index, field })
        };
        let optional = |field: &str| record.get(field).map(str::to_owned);

        Ok(Self {
            fcst_date: required("fcstDate")?,
            fcst_time: required("fcstTime")?,
            category: required("category")?,
            fcst_value: required("fcstValue")?,
            base_date: optional("baseDate"),
            base_time: optional("baseTime"),
            nx: optional("nx"),
            ny: optional("ny"),
        })
    }

    /// Row key: `fcstDate ++ fcstTime`, no separator.
    pub fn dt_fcst(&self) -> String {
        format!("{}{}", self.fcst_date, self.fcst_time)
    }
}

/// Pivot forecast records into one row per `DT_fcst`.
///
/// `DT_base`, `NX` and `NY` come from the query, not the records. Rows are
/// ascending by `DT_fcst`, columns ascending by name. A repeated
/// (timestamp, category) keeps the later value. A category that collides
/// with a fixed column name is overwritten by the fixed value.
pub fn to_forecast_table(records: &[Record], query: &ForecastQuery) -> Result<ForecastTable> {
    let mut grid: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut columns: BTreeSet<String> = [DT_BASE, DT_FCST, NX, NY]
        .into_iter()
        .map(str::to_owned)
        .collect();

    for (index, record) in records.iter().enumerate() {
        let fr = ForecastRecord::from_record(index, record)?;
        let key = fr.dt_fcst();
        columns.insert(fr.category.clone());
        grid.entry(key).or_default().insert(fr.category, fr.fcst_value);
    }

    let dt_base = query.dt_base();
    let mut table = Table::new(columns.into_iter().collect());
    for (dt_fcst, values) in grid {
        let cells = table
            .columns()
            .iter()
            .map(|column| match column.as_str() {
                DT_BASE => Some(dt_base.clone()),
                DT_FCST => Some(dt_fcst.clone()),
                NX => Some(query.nx.clone()),
                NY => Some(query.ny.clone()),
                category => values.get(category).cloned(),
            })
            .collect();
        table.push_row(cells);
    }

    Ok(ForecastTable(table))
}

/// Pivoted forecast: see [`to_forecast_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ForecastTable(Table);

impl ForecastTable {
    pub fn into_table(self) -> Table {
        self.0
    }

    /// Category columns, i.e. everything except the four fixed ones.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| ![DT_BASE, DT_FCST, NX, NY].contains(c))
    }

    /// The row for a forecast timestamp, e.g. `"202102250600"`.
    pub fn at(&self, dt_fcst: &str) -> Option<Row<'_>> {
        self.0.rows().find(|row| row.get(DT_FCST) == Some(dt_fcst))
    }
}

impl Deref for ForecastTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}

impl fmt::Display for ForecastTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
