use std::sync::Arc;

use chrono::Local;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer,
};
use tokio_util::sync::CancellationToken;

use crate::aggregator::ClimateAggregator;
use crate::config::ScoutConfig;
use crate::error::{ClimateError, GeocodeError};
use crate::formatters::{format_insight_card, tool_response};
use crate::geocode::{Geocoder, OpenMeteoGeocoder};
use crate::models::{
    AggregationResult, ClimateQuery, Coordinates, DateRange, GetDailyConditionsRequest, GetPowerDataRequest,
    ParameterSet,
};
use crate::playback::PlaybackSession;

const DEFAULT_MONTHS_BACK: u32 = 1;
const APOLOGY: &str = "Sorry, there was a problem";

/// MCP service exposing the climate aggregator as tools
#[derive(Clone)]
pub struct SiteScout {
    aggregator: ClimateAggregator,
    geocoder: Arc<dyn Geocoder>,
    shutdown: CancellationToken,
    tool_router: ToolRouter<Self>,
}

impl SiteScout {
    /// Creates the service with the public POWER and geocoding clients
    pub fn new(config: &ScoutConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let aggregator = ClimateAggregator::new(config.power.clone())?;
        let geocoder = OpenMeteoGeocoder::new(config.geocoding.clone())?;
        Ok(Self::with_parts(aggregator, Arc::new(geocoder), shutdown))
    }

    pub fn with_parts(
        aggregator: ClimateAggregator,
        geocoder: Arc<dyn Geocoder>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            aggregator,
            geocoder,
            shutdown,
            tool_router: Self::tool_router(),
        }
    }

    /// Resolves the request's location. A place name wins over coordinates.
    async fn resolve_location(
        &self,
        request: &GetPowerDataRequest,
    ) -> Result<(Coordinates, Option<String>), McpError> {
        if let Some(place) = request.location.as_deref().filter(|p| !p.trim().is_empty()) {
            let coordinates = self
                .geocoder
                .geocode(place)
                .await
                .map_err(|e| geocode_error(&e))?;
            return Ok((coordinates, Some(place.to_string())));
        }

        match (request.latitude, request.longitude) {
            (Some(latitude), Some(longitude)) => Ok((
                Coordinates {
                    latitude,
                    longitude,
                },
                None,
            )),
            _ => Err(caller_error(
                "Please provide either a location name or latitude/longitude coordinates for the `get_power_data` tool.",
            )),
        }
    }

    /// Runs a query until it completes, the client cancels the request,
    /// or the server shuts down.
    async fn run_query(
        &self,
        query: &ClimateQuery,
        request: &CancellationToken,
    ) -> Result<AggregationResult, McpError> {
        let cancel = self.shutdown.child_token();
        let result = tokio::select! {
            biased;
            () = request.cancelled() => Err(ClimateError::Cancelled),
            result = self.aggregator.aggregate(query, &cancel) => result,
        };
        result.map_err(|e| climate_error(&e))
    }
}

/// Bad input from the caller, worded as an apology.
fn caller_error(reason: impl std::fmt::Display) -> McpError {
    McpError::invalid_params(format!("{APOLOGY}: {reason}"), None)
}

/// Upstream or internal failure, worded as an apology.
fn upstream_error(reason: impl std::fmt::Display) -> McpError {
    McpError::internal_error(format!("{APOLOGY}: {reason}"), None)
}

fn geocode_error(err: &GeocodeError) -> McpError {
    match err {
        GeocodeError::NotFound { .. } => caller_error(err),
        GeocodeError::Failed { .. } | GeocodeError::Client(_) => upstream_error(err),
    }
}

fn climate_error(err: &ClimateError) -> McpError {
    upstream_error(err)
}

/// Both dates or neither: a half-specified range falls back to the
/// previous calendar year.
fn requested_dates(request: &GetPowerDataRequest, today: chrono::NaiveDate) -> DateRange {
    match (&request.start, &request.end) {
        (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
            DateRange::explicit(start.as_str(), end.as_str())
        }
        _ => DateRange::previous_calendar_year(today),
    }
}

#[tool_handler]
impl ServerHandler for SiteScout {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "renewable-site-scout".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Renewable Site Scout: climate statistics from NASA POWER for judging \
                solar and wind potential. Call get_power_data with a place name or \
                coordinates; use get_daily_conditions for a recent day-by-day view."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl SiteScout {
    /// Summarises NASA POWER daily data for a location
    #[tool(description = "Fetches NASA POWER daily data (solar, wind, temp, precipitation) for a location. Provide either a location name for geocoding, or explicit latitude and longitude coordinates. Dates are YYYYMMDD and default to the previous full calendar year.")]
    async fn get_power_data(
        &self,
        Parameters(request): Parameters<GetPowerDataRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Getting power data for location={:?} lat={:?} lon={:?}",
            request.location,
            request.latitude,
            request.longitude
        );

        let (coordinates, place) = self.resolve_location(&request).await?;
        let dates = requested_dates(&request, Local::now().date_naive());
        let query = ClimateQuery::new(
            coordinates.latitude,
            coordinates.longitude,
            dates,
            ParameterSet::SiteSuitability,
        );

        let result = self.run_query(&query, &context.ct).await?;

        let mut text = String::new();
        if let Some(place) = &place {
            text.push_str(&format!(
                "Geocoded \"{place}\" to {:.4}, {:.4}.\n\n",
                coordinates.latitude, coordinates.longitude
            ));
        }
        text.push_str(&format_insight_card(&result.stats));

        let payload =
            tool_response(&result, place.as_deref()).map_err(upstream_error)?;
        let payload = Content::json(payload)?;

        Ok(CallToolResult::success(vec![Content::text(text), payload]))
    }

    /// Lists recent daily temperature and 50m wind readings
    #[tool(description = "Get day-by-day temperature and 50m wind speed (with daily min/max) for the last few months at a latitude/longitude. Useful for reviewing recent conditions one day at a time.")]
    async fn get_daily_conditions(
        &self,
        Parameters(request): Parameters<GetDailyConditionsRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let months = request.months_back.unwrap_or(DEFAULT_MONTHS_BACK);
        tracing::info!(
            "Getting daily conditions for coordinates: {}, {} ({} months)",
            request.latitude,
            request.longitude,
            months
        );

        let dates = DateRange::months_back(months, Local::now().date_naive()).ok_or_else(|| {
            caller_error(format!("months_back {months} is out of range"))
        })?;
        let query = ClimateQuery::new(
            request.latitude,
            request.longitude,
            dates,
            ParameterSet::TemperatureWind,
        );

        let result = self.run_query(&query, &context.ct).await?;

        let session = PlaybackSession::new(result);
        if session.markers().is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No daily observations for this location and period.",
            )]));
        }

        let mut output = format!(
            "Daily conditions ({} days):\n\n",
            session.markers().len()
        );
        for marker in session.markers() {
            output.push_str(&marker.description);
            output.push_str("\n\n");
        }
        output.push_str(&format_insight_card(&session.result().stats));

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    #[test]
    fn explicit_dates_pass_through() {
        let request = GetPowerDataRequest {
            start: Some("20230101".to_string()),
            end: Some("20231231".to_string()),
            ..Default::default()
        };
        assert_eq!(
            requested_dates(&request, today()),
            DateRange::explicit("20230101", "20231231")
        );
    }

    #[test]
    fn half_specified_dates_default_to_last_year() {
        let request = GetPowerDataRequest {
            start: Some("20230101".to_string()),
            ..Default::default()
        };
        assert_eq!(
            requested_dates(&request, today()),
            DateRange::explicit("20250101", "20251231")
        );
    }

    struct FixedGeocoder(Option<Coordinates>);

    #[async_trait::async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, place: &str) -> Result<Coordinates, GeocodeError> {
            self.0.ok_or_else(|| GeocodeError::NotFound {
                place: place.to_string(),
            })
        }
    }

    fn scout(geocoder: FixedGeocoder) -> SiteScout {
        let aggregator = ClimateAggregator::new(crate::config::PowerConfig::default())
            .expect("client creation should succeed");
        SiteScout::with_parts(aggregator, Arc::new(geocoder), CancellationToken::new())
    }

    const PARIS: Coordinates = Coordinates {
        latitude: 48.85,
        longitude: 2.35,
    };

    #[tokio::test]
    async fn place_name_wins_over_coordinates() {
        let scout = scout(FixedGeocoder(Some(PARIS)));
        let request = GetPowerDataRequest {
            location: Some("Paris".to_string()),
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..Default::default()
        };

        let (coordinates, place) = scout.resolve_location(&request).await.expect("resolves");
        assert_eq!(coordinates, PARIS);
        assert_eq!(place.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn coordinates_used_without_place() {
        let scout = scout(FixedGeocoder(None));
        let request = GetPowerDataRequest {
            location: Some("  ".to_string()),
            latitude: Some(29.62),
            longitude: Some(-95.63),
            ..Default::default()
        };

        let (coordinates, place) = scout.resolve_location(&request).await.expect("resolves");
        assert_eq!(coordinates.latitude, 29.62);
        assert_eq!(coordinates.longitude, -95.63);
        assert!(place.is_none());
    }

    #[tokio::test]
    async fn missing_location_is_invalid_params() {
        let scout = scout(FixedGeocoder(None));
        let request = GetPowerDataRequest {
            latitude: Some(29.62),
            ..Default::default()
        };

        let err = scout.resolve_location(&request).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.starts_with("Sorry, there was a problem: "));
        assert!(err.message.contains("latitude/longitude"));
    }

    #[tokio::test]
    async fn unknown_place_is_invalid_params() {
        let scout = scout(FixedGeocoder(None));
        let request = GetPowerDataRequest {
            location: Some("Atlantis".to_string()),
            ..Default::default()
        };

        let err = scout.resolve_location(&request).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.starts_with("Sorry, there was a problem: "));
        assert!(err.message.contains("Atlantis"));
    }

    #[test]
    fn geocode_not_found_is_a_caller_error() {
        let err = geocode_error(&GeocodeError::NotFound {
            place: "Nowhere".to_string(),
        });
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.starts_with("Sorry, there was a problem: "));
        assert!(err.message.contains("Nowhere"));
    }

    #[test]
    fn geocode_failures_read_as_apology() {
        let err = geocode_error(&GeocodeError::Failed {
            place: "Paris".to_string(),
            reason: "HTTP 503".to_string(),
        });
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert_eq!(
            err.message,
            "Sorry, there was a problem: Geocoding failed for \"Paris\". Reason: HTTP 503"
        );
    }

    #[test]
    fn climate_failures_read_as_apology() {
        let err = climate_error(&ClimateError::Fetch("status 500".to_string()));
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert!(err.message.starts_with("Sorry, there was a problem"));
    }

    fn site_query() -> ClimateQuery {
        ClimateQuery::new(
            29.62,
            -95.63,
            DateRange::explicit("20230101", "20231231"),
            ParameterSet::SiteSuitability,
        )
    }

    #[tokio::test]
    async fn shutdown_cancels_queries() {
        let shutdown = CancellationToken::new();
        let aggregator = ClimateAggregator::new(crate::config::PowerConfig::default())
            .expect("client creation should succeed");
        let scout = SiteScout::with_parts(
            aggregator,
            Arc::new(FixedGeocoder(None)),
            shutdown.clone(),
        );
        shutdown.cancel();

        let err = scout
            .run_query(&site_query(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert!(err.message.starts_with("Sorry, there was a problem: "));
        assert!(err.message.contains("cancelled"));
    }

    #[tokio::test]
    async fn client_cancellation_stops_the_query() {
        let scout = scout(FixedGeocoder(None));
        let request = CancellationToken::new();
        request.cancel();

        let err = scout.run_query(&site_query(), &request).await.unwrap_err();
        assert!(err.message.contains("cancelled"));
    }
}
