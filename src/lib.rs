//! Renewable Site Scout
//!
//! Climate statistics from the NASA POWER daily point API for judging
//! solar and wind sites, exposed as MCP tools for an AI tool-calling loop.

pub mod aggregator;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatters;
pub mod geocode;
pub mod models;
pub mod playback;
pub mod service;

pub use crate::aggregator::{parse_daily, summarize, ClimateAggregator};
pub use crate::config::{GeocodingConfig, PowerConfig, ScoutConfig};
pub use crate::error::{ClimateError, ConfigError, GeocodeError};
pub use crate::geocode::{Geocoder, OpenMeteoGeocoder};
pub use crate::models::{
    AggregationResult, ClimateQuery, Coordinates, DailySeries, DateRange, MetricStats,
    ParameterSet, ResultMeta, SummaryStatistics,
};
pub use crate::playback::{Marker, PlaybackSession};
pub use crate::service::SiteScout;
