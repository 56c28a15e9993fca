use odata_geo::{STORAGE_SRID, Srid};
use serde::{Deserialize, Serialize};

/// Knobs shared by the compiler and the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Leading character of bound parameter names (default: `@`).
    pub parameter_prefix: char,
    /// CRS that spatial literals in filters are written in (default: 4258).
    pub source_srid: Srid,
    /// Longest accepted `$filter` text in characters (default: 2000).
    pub max_filter_length: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            parameter_prefix: '@',
            source_srid: STORAGE_SRID,
            max_filter_length: 2000,
        }
    }
}

impl FilterOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: char) -> Self {
        self.parameter_prefix = prefix;
        self
    }

    #[must_use]
    pub fn with_source_srid(mut self, srid: Srid) -> Self {
        self.source_srid = srid;
        self
    }

    #[must_use]
    pub fn with_max_filter_length(mut self, max: usize) -> Self {
        self.max_filter_length = max;
        self
    }
}
