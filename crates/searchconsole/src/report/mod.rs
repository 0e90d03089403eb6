//! Query results
//!
//! A [`Report`] keeps the rows in the order the remote service returned
//! them together with the [`QuerySpec`] that produced them, so dimension
//! values can be looked up by name and exported as a table.

mod frame;

pub use frame::DataFrame;

use serde_json::{json, Map, Value};
use std::ops::Index;
use std::slice;

use crate::query::{Dimension, Metric, QuerySpec};
use crate::transport::RawRow;

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// One slot per requested dimension; `None` when the remote row
    /// carried fewer keys than were requested.
    dimensions: Vec<(Dimension, Option<String>)>,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    /// Absent for search types that do not report a position.
    pub position: Option<f64>,
}

impl Row {
    fn from_raw(raw: RawRow, dimensions: &[Dimension], reports_position: bool) -> Self {
        let mut keys = raw.keys.into_iter();
        Self {
            dimensions: dimensions.iter().map(|d| (*d, keys.next())).collect(),
            clicks: raw.clicks.round() as u64,
            impressions: raw.impressions.round() as u64,
            ctr: raw.ctr,
            position: if reports_position { raw.position } else { None },
        }
    }

    /// Value of a requested dimension.
    pub fn get(&self, dimension: Dimension) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|(d, _)| *d == dimension)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Dimension value or metric by column name.
    pub fn value(&self, column: &str) -> Option<Value> {
        if let Ok(dimension) = column.parse::<Dimension>() {
            return self.get(dimension).map(Value::from);
        }
        match column {
            "clicks" => Some(json!(self.clicks)),
            "impressions" => Some(json!(self.impressions)),
            "ctr" => Some(json!(self.ctr)),
            "position" => self.position.map(Value::from),
            _ => None,
        }
    }

    /// Dimension values in request order.
    pub fn keys(&self) -> impl Iterator<Item = Option<&str>> {
        self.dimensions.iter().map(|(_, v)| v.as_deref())
    }

    fn metric(&self, metric: Metric) -> Value {
        match metric {
            Metric::Clicks => json!(self.clicks),
            Metric::Impressions => json!(self.impressions),
            Metric::Ctr => json!(self.ctr),
            Metric::Position => self.position.map(Value::from).unwrap_or(Value::Null),
        }
    }
}

/// Rows returned by one execution of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    spec: QuerySpec,
    rows: Vec<Row>,
    pages: usize,
}

impl Report {
    pub(crate) fn new(spec: QuerySpec, raw: Vec<RawRow>, pages: usize) -> Self {
        let reports_position = spec.search_type().reports_position();
        let rows = raw
            .into_iter()
            .map(|r| Row::from_raw(r, spec.dimensions(), reports_position))
            .collect();
        Self { spec, rows, pages }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.rows.contains(row)
    }

    /// The query state that produced this report.
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Number of requests issued to build the report.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn dimensions(&self) -> &[Dimension] {
        self.spec.dimensions()
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.spec.metrics()
    }

    /// Dimensions in request order, then metrics.
    pub fn columns(&self) -> Vec<&'static str> {
        self.dimensions()
            .iter()
            .map(Dimension::as_str)
            .chain(self.metrics().iter().map(Metric::as_str))
            .collect()
    }

    pub fn to_dataframe(&self) -> DataFrame {
        let metrics = self.metrics();
        let columns = self.columns().into_iter().map(String::from).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.keys()
                    .map(|key| key.map_or(Value::Null, Value::from))
                    .chain(metrics.iter().map(|m| row.metric(*m)))
                    .collect()
            })
            .collect();
        DataFrame::new(columns, rows)
    }

    /// One JSON object per row, keyed by column name.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.to_dataframe().records()
    }
}

impl Index<usize> for Report {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
