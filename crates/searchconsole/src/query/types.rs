//! Search Analytics enumerations
//!
//! Every value the remote schema accepts for dimensions, filter operators,
//! search types, aggregation and data state. Wire names are the camelCase
//! strings the API uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Declares a closed set of wire strings with `ALL`, `as_str` and `allowed`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn lookup(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Comma separated list of accepted wire names, for error messages.
            pub fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

wire_enum! {
    /// Categorical axis the remote service groups metrics by.
    Dimension {
        Query => "query",
        Page => "page",
        Country => "country",
        Device => "device",
        SearchAppearance => "searchAppearance",
        Date => "date",
    }
}

wire_enum! {
    /// Filter operator. Regex operators use RE2 syntax, checked remotely.
    Operator {
        Contains => "contains",
        Equals => "equals",
        NotContains => "notContains",
        NotEquals => "notEquals",
        IncludingRegex => "includingRegex",
        ExcludingRegex => "excludingRegex",
    }
}

wire_enum! {
    /// Index / vertical a query targets.
    SearchType {
        Web => "web",
        Image => "image",
        Video => "video",
        News => "news",
        Discover => "discover",
        GoogleNews => "googleNews",
    }
}

wire_enum! {
    /// How the remote service combines rows for the same dimension values.
    AggregationType {
        Auto => "auto",
        ByPage => "byPage",
        ByProperty => "byProperty",
        ByNewsShowcasePanel => "byNewsShowcasePanel",
    }
}

wire_enum! {
    /// Whether fresh, not yet finalized data is included.
    DataState {
        Final => "final",
        All => "all",
    }
}

wire_enum! {
    /// Combination rule inside a filter group. The API only supports `and`.
    GroupType {
        And => "and",
    }
}

wire_enum! {
    /// Numeric columns of every result row.
    Metric {
        Clicks => "clicks",
        Impressions => "impressions",
        Ctr => "ctr",
        Position => "position",
    }
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Equals
    }
}

impl Default for SearchType {
    fn default() -> Self {
        SearchType::Web
    }
}

impl Default for GroupType {
    fn default() -> Self {
        GroupType::And
    }
}

impl SearchType {
    /// Discover and Google News do not report an average position.
    pub fn reports_position(&self) -> bool {
        !matches!(self, SearchType::Discover | SearchType::GoogleNews)
    }

    /// Metric columns returned for this search type, in response order.
    pub fn metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .iter()
            .copied()
            .filter(|m| *m != Metric::Position || self.reports_position())
            .collect()
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| Error::InvalidDimension {
            value: s.to_string(),
            reason: "unknown dimension",
            allowed: Self::allowed(),
        })
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| Error::InvalidOperator {
            value: s.to_string(),
            allowed: Self::allowed(),
        })
    }
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| Error::InvalidSearchType {
            value: s.to_string(),
            allowed: Self::allowed(),
        })
    }
}

impl FromStr for AggregationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
            .ok_or_else(|| Error::invalid_argument("aggregation type", s, format!("one of: {}", Self::allowed())))
    }
}

impl FromStr for DataState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
            .ok_or_else(|| Error::invalid_argument("data state", s, format!("one of: {}", Self::allowed())))
    }
}
