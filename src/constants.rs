//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Research stage constants
pub mod research {
    /// Default token budget per chunk
    pub const DEFAULT_CHUNK_TOKENS: usize = 2048;

    /// Default number of concurrent model calls per research run
    pub const DEFAULT_MAX_PARALLEL: usize = 4;
}

/// Freshness classification thresholds (inclusive, in days)
pub mod freshness {
    /// Newest document at most this old → hot
    pub const HOT_MAX_AGE_DAYS: i64 = 7;

    /// Newest document at most this old → warm; older → cold
    pub const WARM_MAX_AGE_DAYS: i64 = 30;
}

/// Report stage constants
pub mod report {
    /// Locale used when a request does not specify one
    pub const DEFAULT_LOCALE: &str = "en-US";

    /// Output when there are no report parts to render
    pub const NO_INSIGHTS_FALLBACK: &str = "No insights found\n";

    /// Heading emitted by the report template that must sit at level two
    pub const KEY_COLUMNS_RAW_HEADING: &str = "# Key Columns";

    pub const KEY_COLUMNS_HEADING: &str = "## Key Columns";
}

/// Retrieval constants
pub mod retrieval {
    /// Default fixture directory (relative to the working directory)
    pub const DEFAULT_FIXTURES_DIR: &str = "fixtures/glean";

    /// Fallback environment variable for the live search token
    pub const API_TOKEN_ENV: &str = "GLEAN_API_TOKEN";
}
