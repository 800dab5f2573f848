use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ALLSKY_SFC_SW_DWN, PRECTOTCORR, T2M, T2M_MAX, T2M_MIN, WS10M, WS50M, WS50M_MAX, WS50M_MIN,
};

// ============================================================================
// Query Models
// ============================================================================

/// Parameter code -> (date key -> observation). Date keys are `YYYYMMDD`,
/// so map order is chronological order.
pub type DailySeries = BTreeMap<String, BTreeMap<String, f64>>;

/// A statistics bucket: one mean channel plus optional dedicated min/max
/// channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricBucket {
    pub name: &'static str,
    pub mean: &'static str,
    pub min: Option<&'static str>,
    pub max: Option<&'static str>,
}

const SITE_SUITABILITY_BUCKETS: &[MetricBucket] = &[
    MetricBucket {
        name: "ghi",
        mean: ALLSKY_SFC_SW_DWN,
        min: None,
        max: None,
    },
    MetricBucket {
        name: "wind",
        mean: WS10M,
        min: None,
        max: None,
    },
    MetricBucket {
        name: "temp",
        mean: T2M,
        min: Some(T2M_MIN),
        max: Some(T2M_MAX),
    },
    MetricBucket {
        name: "precip",
        mean: PRECTOTCORR,
        min: None,
        max: None,
    },
];

const TEMPERATURE_WIND_BUCKETS: &[MetricBucket] = &[
    MetricBucket {
        name: "temp",
        mean: T2M,
        min: Some(T2M_MIN),
        max: Some(T2M_MAX),
    },
    MetricBucket {
        name: "wind50m",
        mean: WS50M,
        min: Some(WS50M_MIN),
        max: Some(WS50M_MAX),
    },
];

/// The fixed parameter lists requested from POWER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSet {
    /// Irradiance, 10m wind, temperature and precipitation
    SiteSuitability,
    /// Temperature and 50m wind, each with min/max, for day-by-day playback
    TemperatureWind,
}

impl ParameterSet {
    /// Parameter codes in request order
    pub fn codes(self) -> &'static [&'static str] {
        match self {
            Self::SiteSuitability => &[ALLSKY_SFC_SW_DWN, WS10M, T2M, T2M_MIN, T2M_MAX, PRECTOTCORR],
            Self::TemperatureWind => &[T2M, T2M_MAX, T2M_MIN, WS50M, WS50M_MAX, WS50M_MIN],
        }
    }

    pub fn buckets(self) -> &'static [MetricBucket] {
        match self {
            Self::SiteSuitability => SITE_SUITABILITY_BUCKETS,
            Self::TemperatureWind => TEMPERATURE_WIND_BUCKETS,
        }
    }
}

/// Start and end dates exactly as the upstream expects them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    /// Dates passed through verbatim
    pub fn explicit(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// From `months` calendar months before `today` up to `today`.
    /// The start day is clamped to the end of a shorter month.
    pub fn months_back(months: u32, today: NaiveDate) -> Option<Self> {
        let start = today.checked_sub_months(Months::new(months))?;
        Some(Self {
            start: compact(start),
            end: compact(today),
        })
    }

    /// January 1st to December 31st of the year before `today`
    pub fn previous_calendar_year(today: NaiveDate) -> Self {
        let year = today.year() - 1;
        Self {
            start: format!("{year}0101"),
            end: format!("{year}1231"),
        }
    }
}

fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// One aggregation request
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub dates: DateRange,
    pub parameters: ParameterSet,
}

impl ClimateQuery {
    pub fn new(latitude: f64, longitude: f64, dates: DateRange, parameters: ParameterSet) -> Self {
        Self {
            latitude,
            longitude,
            dates,
            parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// Result Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub avg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Statistics keyed by bucket name (`ghi`, `wind`, `temp`, ...). Buckets
/// without usable data are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryStatistics(BTreeMap<String, MetricStats>);

impl SummaryStatistics {
    pub fn get(&self, bucket: &str) -> Option<&MetricStats> {
        self.0.get(bucket)
    }

    pub fn insert(&mut self, bucket: &str, stats: MetricStats) {
        self.0.insert(bucket.to_string(), stats);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricStats)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMeta {
    pub lat: f64,
    pub lon: f64,
    pub start: String,
    pub end: String,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub meta: ResultMeta,
    pub daily: DailySeries,
    pub stats: SummaryStatistics,
}

// ============================================================================
// NASA POWER API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PowerResponse {
    pub properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
pub struct PowerProperties {
    pub parameter: DailySeries,
}

// ============================================================================
// Open-Meteo Geocoding API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetPowerDataRequest {
    #[schemars(description = "Name of the location (e.g. \"Paris, France\", \"Sahara Desert\"). Use this if latitude and longitude are not provided.")]
    #[serde(default)]
    pub location: Option<String>,
    #[schemars(description = "Latitude for the location. Use this if a location name is not provided.")]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[schemars(description = "Longitude for the location. Use this if a location name is not provided.")]
    #[serde(default)]
    pub longitude: Option<f64>,
    #[schemars(description = "Optional start date in YYYYMMDD format. Defaults to the beginning of the previous full calendar year.")]
    #[serde(default)]
    pub start: Option<String>,
    #[schemars(description = "Optional end date in YYYYMMDD format. Defaults to the end of the previous full calendar year.")]
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetDailyConditionsRequest {
    #[schemars(description = "Latitude of the location")]
    pub latitude: f64,
    #[schemars(description = "Longitude of the location")]
    pub longitude: f64,
    #[schemars(description = "How many months back from today to fetch (default 1)")]
    #[serde(default)]
    pub months_back: Option<u32>,
}
