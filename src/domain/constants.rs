//! Region and pipeline domain constants
//!
//! Values specific to the Jeju service region and the batch ingestion
//! pipeline. Matching/pricing thresholds are policy constants tuned against
//! observed registry behavior, not values the upstream sources define.

/// Service region bounding box (decimal degrees)
pub mod region {
    /// Southernmost latitude of the service region
    pub const MIN_LATITUDE: f64 = 33.0;

    /// Northernmost latitude of the service region
    pub const MAX_LATITUDE: f64 = 33.6;

    /// Westernmost longitude of the service region
    pub const MIN_LONGITUDE: f64 = 126.1;

    /// Easternmost longitude of the service region
    pub const MAX_LONGITUDE: f64 = 127.0;

    /// Telephone area code for the region
    pub const AREA_CODE: &str = "064";

    /// Top-level administrative token stripped during address normalization
    pub const PROVINCE_PREFIX: &str = "제주특별자치도";

    /// Returns true when the coordinate pair lies inside the service region.
    pub fn contains(latitude: f64, longitude: f64) -> bool {
        (MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude)
            && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude)
    }
}

/// Cross-source record matching policy
pub mod matching {
    /// Radius within which two records may describe the same establishment (meters).
    ///
    /// Registry coordinates for the same storefront drift by tens of meters;
    /// 50 m keeps neighboring shops in dense streets apart.
    pub const FUZZY_MATCH_RADIUS_METERS: f64 = 50.0;

    /// Mean Earth radius used by the haversine distance (meters)
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
}

/// Batch ingestion limits
pub mod ingest {
    /// Hard ceiling on pages fetched per run, guarding against a source
    /// reporting a bogus total count.
    pub const MAX_PAGES_PER_RUN: u32 = 100;

    /// Delay between consecutive page fetches (milliseconds)
    pub const INTER_PAGE_DELAY_MS: u64 = 100;

    /// HTTP connect/read timeout (seconds)
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
}

/// Price statistics policy
pub mod pricing {
    /// Minimum observation count before statistics are considered meaningful
    pub const MIN_OBSERVATIONS: usize = 5;

    /// Prices below this fraction of the category average are "cheap"
    pub const CHEAP_THRESHOLD_RATIO: f64 = 0.8;

    /// Prices above this fraction of the category average are "expensive"
    pub const EXPENSIVE_THRESHOLD_RATIO: f64 = 1.2;

    /// Number of equal-width histogram ranges in a snapshot
    pub const HISTOGRAM_RANGES: usize = 4;

    /// Half-width of the accepted window around a clicked price (KRW)
    pub const PRICE_SEARCH_MARGIN: i64 = 2_500;

    /// Default geographic radius for price-range search (meters)
    pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 1_000.0;

    /// Statistics cache entry time-to-live (seconds)
    pub const CACHE_TTL_SECONDS: u64 = 3_600;
}
