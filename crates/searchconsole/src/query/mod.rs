//! Search Analytics Query Builder
//!
//! A [`Query`] is an immutable value: every builder call consumes it and
//! returns the refined query, so a base query can be cloned and refined in
//! several directions without one branch affecting another. Validation
//! happens at the offending call, before any network I/O.
//!
//! ```no_run
//! # async fn run(property: &searchconsole::WebProperty) -> searchconsole::Result<()> {
//! let report = property
//!     .query()
//!     .range_days("today", -7)?
//!     .dimension("date")?
//!     .filter("query", "dress", "contains")?
//!     .filter("page", "/womens-clothing/", "contains")?
//!     .limit(20_000)?
//!     .get()
//!     .await?;
//! println!("{} rows", report.len());
//! # Ok(())
//! # }
//! ```

pub mod dates;
pub mod request;
pub mod spec;
pub mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::report::Report;
use crate::transport::{RawRow, Transport};

pub use dates::{DateExpr, DateRange, Offset};
pub use request::{DimensionFilter, FilterGroup, QueryRequest, MAX_ROWS_PER_REQUEST};
pub use spec::QuerySpec;
pub use types::{AggregationType, DataState, Dimension, GroupType, Metric, Operator, SearchType};

/// Wait between consecutive page requests of one `get`.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct Query {
    transport: Arc<dyn Transport>,
    site_url: String,
    spec: QuerySpec,
    pacing: Duration,
}

impl Query {
    pub fn new(transport: Arc<dyn Transport>, site_url: impl Into<String>) -> Self {
        Self {
            transport,
            site_url: site_url.into(),
            spec: QuerySpec::default(),
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the wait between paged requests.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Explicit inclusive range. Each bound is `YYYY-MM-DD`, `today` or
    /// `yesterday`.
    pub fn range(self, start: &str, end: &str) -> Result<Self> {
        let range = DateRange::between(start.parse()?, end.parse()?, dates::today())?;
        Ok(self.date_range(range))
    }

    /// Range from an anchor and a signed day count, anchor included:
    /// `range_days("today", -7)` is the last seven days.
    pub fn range_days(self, start: &str, days: i64) -> Result<Self> {
        let range = DateRange::from_offset(start.parse()?, Offset::Days(days), dates::today())?;
        Ok(self.date_range(range))
    }

    /// Range from an anchor and a signed month count:
    /// `range_months("2017-01-01", 1)` ends on 2017-01-31.
    pub fn range_months(self, start: &str, months: i32) -> Result<Self> {
        let range = DateRange::from_offset(start.parse()?, Offset::Months(months), dates::today())?;
        Ok(self.date_range(range))
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.spec.range = Some(range);
        self
    }

    /// Append one dimension. Unknown or repeated names are rejected.
    pub fn dimension(mut self, name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        let dimension: Dimension = name.parse()?;
        if self.spec.dimensions.contains(&dimension) {
            return Err(Error::InvalidDimension {
                value: name.to_string(),
                reason: "already requested",
                allowed: Dimension::allowed(),
            });
        }
        self.spec.dimensions.push(dimension);
        Ok(self)
    }

    /// Append several dimensions, in order.
    pub fn dimensions<I>(self, names: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(self, |query, name| query.dimension(name))
    }

    /// Append a filter. The expression is passed through as is; regex
    /// syntax is checked by the remote service.
    pub fn filter(
        mut self,
        dimension: impl AsRef<str>,
        expression: impl Into<String>,
        operator: impl AsRef<str>,
    ) -> Result<Self> {
        let dimension: Dimension = dimension.as_ref().parse()?;
        let operator: Operator = operator.as_ref().parse()?;
        self.spec.filters.push(DimensionFilter {
            dimension,
            expression: expression.into(),
            operator,
        });
        Ok(self)
    }

    pub fn search_type(mut self, value: impl AsRef<str>) -> Result<Self> {
        self.spec.search_type = value.as_ref().parse()?;
        Ok(self)
    }

    pub fn aggregation_type(mut self, value: impl AsRef<str>) -> Result<Self> {
        self.spec.aggregation_type = Some(value.as_ref().parse()?);
        Ok(self)
    }

    pub fn data_state(mut self, value: impl AsRef<str>) -> Result<Self> {
        self.spec.data_state = Some(value.as_ref().parse()?);
        Ok(self)
    }

    /// Maximum number of rows. Limits above [`MAX_ROWS_PER_REQUEST`] are
    /// fetched in several pages.
    pub fn limit(mut self, n: i64) -> Result<Self> {
        self.spec.limit = Some(non_negative("row limit", n)?);
        Ok(self)
    }

    /// Zero-based index of the first row returned.
    pub fn start_row(mut self, n: i64) -> Result<Self> {
        self.spec.start_row = Some(non_negative("start row", n)?);
        Ok(self)
    }

    /// The request body of the first page, without sending it.
    pub fn request(&self) -> Result<QueryRequest> {
        self.spec.to_request()
    }

    /// Execute the query. Transport errors are returned unchanged; an empty
    /// result is an empty report.
    pub async fn get(&self) -> Result<Report> {
        let mut request = self.spec.to_request()?;
        let first_row = request.start_row.unwrap_or(0);
        let mut rows: Vec<RawRow> = Vec::new();
        let mut pages = 0usize;

        loop {
            if pages > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            debug!(
                site = %self.site_url,
                start_row = ?request.start_row,
                row_limit = ?request.row_limit,
                "Executing search analytics query"
            );
            let response = self.transport.query(&self.site_url, &request).await?;
            pages += 1;

            let received = response.rows.len() as u64;
            rows.extend(response.rows);

            // Without a limit the remote default applies and one page is all.
            let Some(limit) = self.spec.limit else {
                break;
            };
            let step = request.row_limit.unwrap_or(MAX_ROWS_PER_REQUEST);
            if received == 0 || received < step || rows.len() as u64 >= limit {
                break;
            }

            request.start_row = Some(first_row + rows.len() as u64);
            let remaining = limit - rows.len() as u64;
            request.row_limit = Some(remaining.min(MAX_ROWS_PER_REQUEST));
        }

        if let Some(limit) = self.spec.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        debug!(site = %self.site_url, rows = rows.len(), pages, "Query complete");
        Ok(Report::new(self.spec.clone(), rows, pages))
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.site_url == other.site_url && self.spec == other.spec
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("site_url", &self.site_url)
            .field("spec", &self.spec)
            .finish()
    }
}

fn non_negative(name: &'static str, n: i64) -> Result<u64> {
    u64::try_from(n).map_err(|_| Error::invalid_argument(name, n, "a non-negative integer"))
}
