//! Search Analytics request schema
//!
//! Fixed wire shape of `searchAnalytics.query`. Optional fields are left out
//! of the payload when unset so the remote defaults apply.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{AggregationType, DataState, Dimension, GroupType, Operator, SearchType};

/// Largest `rowLimit` the remote service accepts in one request.
pub const MAX_ROWS_PER_REQUEST: u64 = 25_000;

/// One `(dimension, expression, operator)` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub dimension: Dimension,
    pub expression: String,
    pub operator: Operator,
}

/// Filters combined with AND semantics by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroup {
    #[serde(default)]
    pub group_type: GroupType,
    pub filters: Vec<DimensionFilter>,
}

/// Serialized request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimension_filter_groups: Vec<FilterGroup>,
    #[serde(default)]
    pub search_type: SearchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_type: Option<AggregationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_state: Option<DataState>,
}

impl QueryRequest {
    /// All filters across groups, in order.
    pub fn filters(&self) -> impl Iterator<Item = &DimensionFilter> {
        self.dimension_filter_groups.iter().flat_map(|g| g.filters.iter())
    }
}
