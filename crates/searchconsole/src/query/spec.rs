//! Accumulated query state and its serialization into [`QueryRequest`].

use super::dates::DateRange;
use super::request::{DimensionFilter, FilterGroup, QueryRequest, MAX_ROWS_PER_REQUEST};
use super::types::{AggregationType, DataState, Dimension, GroupType, Metric, SearchType};
use crate::error::{Error, Result};

/// Everything a [`Query`](super::Query) has been told so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub(crate) range: Option<DateRange>,
    pub(crate) dimensions: Vec<Dimension>,
    pub(crate) filters: Vec<DimensionFilter>,
    pub(crate) search_type: SearchType,
    pub(crate) aggregation_type: Option<AggregationType>,
    pub(crate) data_state: Option<DataState>,
    pub(crate) limit: Option<u64>,
    pub(crate) start_row: Option<u64>,
}

impl QuerySpec {
    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn filters(&self) -> &[DimensionFilter] {
        &self.filters
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn aggregation_type(&self) -> Option<AggregationType> {
        self.aggregation_type
    }

    pub fn data_state(&self) -> Option<DataState> {
        self.data_state
    }

    /// Total number of rows requested, possibly above the per-request cap.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn start_row(&self) -> Option<u64> {
        self.start_row
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.search_type.metrics()
    }

    /// Serialize into the request for the first page.
    ///
    /// All filters land in a single AND group, in insertion order. The row
    /// limit is capped at [`MAX_ROWS_PER_REQUEST`]; larger limits are served
    /// by paging.
    pub fn to_request(&self) -> Result<QueryRequest> {
        let range = self
            .range
            .ok_or_else(|| Error::InvalidRange("no date range set".to_string()))?;

        let dimension_filter_groups = if self.filters.is_empty() {
            Vec::new()
        } else {
            vec![FilterGroup {
                group_type: GroupType::And,
                filters: self.filters.clone(),
            }]
        };

        Ok(QueryRequest {
            start_date: range.start(),
            end_date: range.end(),
            dimensions: self.dimensions.clone(),
            dimension_filter_groups,
            search_type: self.search_type,
            aggregation_type: self.aggregation_type,
            row_limit: self.limit.map(|n| n.min(MAX_ROWS_PER_REQUEST)),
            start_row: self.start_row,
            data_state: self.data_state,
        })
    }
}
