//! NASA POWER climate aggregator
//!
//! Fetches daily point observations for a fixed parameter set and reduces
//! them to per-bucket summary statistics. Failures here are strict: every
//! transport, status or shape problem is returned to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::PowerConfig;
use crate::constants::{MISSING_SENTINEL, POWER_FORMAT, USER_AGENT};
use crate::error::ClimateError;
use crate::models::{
    AggregationResult, ClimateQuery, DailySeries, MetricStats, ParameterSet, PowerResponse,
    ResultMeta, SummaryStatistics,
};

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Stateless client for the POWER daily point endpoint. Cheap to clone;
/// concurrent calls share nothing but the connection pool.
#[derive(Debug, Clone)]
pub struct ClimateAggregator {
    client: Arc<Client>,
    config: PowerConfig,
}

impl ClimateAggregator {
    pub fn new(config: PowerConfig) -> Result<Self, ClimateError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClimateError::Fetch(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Fetches the query's series and computes their statistics.
    ///
    /// Exactly one outbound request per call. Resolves to
    /// [`ClimateError::Cancelled`] as soon as `cancel` fires.
    #[instrument(
        skip(self, query, cancel),
        fields(lat = %query.latitude, lon = %query.longitude, start = %query.dates.start, end = %query.dates.end)
    )]
    pub async fn aggregate(
        &self,
        query: &ClimateQuery,
        cancel: &CancellationToken,
    ) -> Result<AggregationResult, ClimateError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ClimateError::Cancelled),
            result = self.fetch_and_summarize(query) => result,
        }
    }

    async fn fetch_and_summarize(
        &self,
        query: &ClimateQuery,
    ) -> Result<AggregationResult, ClimateError> {
        let body = self.fetch(query).await?;
        let daily = parse_daily(&body, query.parameters)?;
        let stats = summarize(&daily, query.parameters, self.config.strict_sentinels);

        debug!(buckets = stats.len(), "Computed climate statistics");

        Ok(AggregationResult {
            meta: ResultMeta {
                lat: query.latitude,
                lon: query.longitude,
                start: query.dates.start.clone(),
                end: query.dates.end.clone(),
                parameters: query
                    .parameters
                    .codes()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            },
            daily,
            stats,
        })
    }

    fn query_pairs(&self, query: &ClimateQuery) -> Vec<(&'static str, String)> {
        vec![
            ("parameters", query.parameters.codes().join(",")),
            ("community", self.config.community.clone()),
            ("longitude", query.longitude.to_string()),
            ("latitude", query.latitude.to_string()),
            ("start", query.dates.start.clone()),
            ("end", query.dates.end.clone()),
            ("format", POWER_FORMAT.to_string()),
        ]
    }

    async fn fetch(&self, query: &ClimateQuery) -> Result<String, ClimateError> {
        debug!(url = %self.config.base_url, "Fetching NASA POWER daily data");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query_pairs(query))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClimateError::Fetch(describe_status(status, &body)));
        }

        response.text().await.map_err(|e| self.transport_error(&e))
    }

    fn transport_error(&self, err: &reqwest::Error) -> ClimateError {
        if err.is_timeout() {
            ClimateError::Fetch(format!("timed out after {}s", self.config.timeout_secs))
        } else {
            ClimateError::Fetch(err.to_string())
        }
    }
}

fn describe_status(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("status {status}")
    } else {
        let detail: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("status {status}: {detail}")
    }
}

/// Extracts the requested series from a POWER response body. Every
/// requested code is present in the result; codes the upstream left out
/// map to an empty series.
pub fn parse_daily(body: &str, parameters: ParameterSet) -> Result<DailySeries, ClimateError> {
    let response: PowerResponse =
        serde_json::from_str(body).map_err(|e| ClimateError::Parse(e.to_string()))?;
    let mut available = response.properties.parameter;

    Ok(parameters
        .codes()
        .iter()
        .map(|&code| {
            let series = available.remove(code).unwrap_or_else(|| {
                debug!(parameter = code, "Parameter missing from response");
                BTreeMap::new()
            });
            (code.to_string(), series)
        })
        .collect())
}

/// Computes statistics for every bucket of `parameters`.
///
/// A bucket is present when its mean channel has observations and the
/// first one is not a fill value. With `strict_sentinels`, fill values are
/// dropped from every channel instead and a bucket is present when any
/// valid observation remains.
pub fn summarize(
    daily: &DailySeries,
    parameters: ParameterSet,
    strict_sentinels: bool,
) -> SummaryStatistics {
    let mut stats = SummaryStatistics::default();

    for bucket in parameters.buckets() {
        let Some(series) = daily.get(bucket.mean) else {
            continue;
        };
        let Some(avg) = average(series, strict_sentinels) else {
            continue;
        };

        let channel = |code: Option<&str>| code.and_then(|c| daily.get(c));
        stats.insert(
            bucket.name,
            MetricStats {
                avg,
                min: channel(bucket.min)
                    .and_then(|s| extreme(s, strict_sentinels, f64::min)),
                max: channel(bucket.max)
                    .and_then(|s| extreme(s, strict_sentinels, f64::max)),
            },
        );
    }

    stats
}

fn is_missing(value: f64) -> bool {
    value <= MISSING_SENTINEL
}

fn observations(
    series: &BTreeMap<String, f64>,
    strict_sentinels: bool,
) -> impl Iterator<Item = f64> + '_ {
    series
        .values()
        .copied()
        .filter(move |&v| !(strict_sentinels && is_missing(v)))
}

fn average(series: &BTreeMap<String, f64>, strict_sentinels: bool) -> Option<f64> {
    if !strict_sentinels {
        let first = series.values().next()?;
        if is_missing(*first) {
            return None;
        }
    }

    let (sum, count) = observations(series, strict_sentinels)
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

fn extreme(
    series: &BTreeMap<String, f64>,
    strict_sentinels: bool,
    pick: fn(f64, f64) -> f64,
) -> Option<f64> {
    observations(series, strict_sentinels).reduce(pick)
}
