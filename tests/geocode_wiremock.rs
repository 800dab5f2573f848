//! Integration tests for the Open-Meteo geocoder using wiremock

use renewable_site_scout::{GeocodeError, Geocoder, GeocodingConfig, OpenMeteoGeocoder};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn create_geocoder(mock_server: &MockServer) -> OpenMeteoGeocoder {
    let config = GeocodingConfig {
        base_url: mock_server.uri(),
        timeout_secs: 5,
    };
    OpenMeteoGeocoder::new(config).expect("Failed to create geocoder")
}

#[tokio::test]
async fn resolves_first_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Sugar Land, Texas"))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{
                "id": 4734825,
                "name": "Sugar Land",
                "latitude": 29.61968,
                "longitude": -95.63495,
                "country_code": "US",
                "admin1": "Texas"
            }],
            "generationtime_ms": 0.5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinates = create_geocoder(&mock_server)
        .geocode("Sugar Land, Texas")
        .await
        .expect("geocoding should succeed");

    assert!((coordinates.latitude - 29.61968).abs() < 1e-9);
    assert!((coordinates.longitude + 95.63495).abs() < 1e-9);
}

#[tokio::test]
async fn no_results_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "generationtime_ms": 0.2 })),
        )
        .mount(&mock_server)
        .await;

    let err = create_geocoder(&mock_server)
        .geocode("Atlantis")
        .await
        .unwrap_err();

    assert!(matches!(err, GeocodeError::NotFound { ref place } if place == "Atlantis"));
    assert!(err.to_string().contains("\"Atlantis\""));
}

#[tokio::test]
async fn server_error_names_place_and_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = create_geocoder(&mock_server)
        .geocode("Paris, France")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, GeocodeError::Failed { .. }));
    assert!(message.contains("Paris, France"));
    assert!(message.contains("500"));
}
