//! Integration tests for geocoding, location detection, city resolution
//! and the map hand-off, against a mock Nominatim / IP lookup server.

use cityweather_core::GeocodingConfig;
use cityweather_weather::{
    open_city_in_maps, CityResolver, CitySource, GeocodeError, Geocoder, IpLocationSource,
    Location, LocationError, LocationSource, MapError, MapLauncher,
};
use parking_lot::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geocoder_for(server: &MockServer) -> Geocoder {
    Geocoder::new(&GeocodingConfig {
        base_url: server.uri(),
        user_agent: "cityweather-tests".to_string(),
    })
    .unwrap()
}

/// Records opened URLs instead of starting a browser
#[derive(Default)]
struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl MapLauncher for RecordingLauncher {
    fn open(&self, url: &str) -> Result<(), MapError> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_reverse_geocode_prefers_city() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "display_name": "Kadıköy, İstanbul, Türkiye",
            "address": {
                "town": "Kadıköy",
                "city": "İstanbul",
                "country": "Türkiye"
            }
        })))
        .mount(&mock_server)
        .await;

    let name = geocoder_for(&mock_server)
        .reverse(&Location::new(40.99, 29.03))
        .await
        .unwrap();
    assert_eq!(name, "İstanbul");
}

#[tokio::test]
async fn test_reverse_geocode_without_locality_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "country": "International waters" }
        })))
        .mount(&mock_server)
        .await;

    let result = geocoder_for(&mock_server)
        .reverse(&Location::new(0.0, -30.0))
        .await;
    assert!(matches!(result, Err(GeocodeError::NotFound(_))));
}

#[tokio::test]
async fn test_forward_geocode_parses_string_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Paris"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": "48.8588897", "lon": "2.3200410", "display_name": "Paris, France" }
        ])))
        .mount(&mock_server)
        .await;

    let loc = geocoder_for(&mock_server).search("Paris").await.unwrap();
    assert!((loc.latitude - 48.8588897).abs() < 1e-9);
    assert!((loc.longitude - 2.3200410).abs() < 1e-9);
    assert_eq!(loc.city_name.as_deref(), Some("Paris"));
}

#[tokio::test]
async fn test_forward_geocode_no_match() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let result = geocoder_for(&mock_server).search("Atlantis").await;
    assert!(matches!(result, Err(GeocodeError::NotFound(city)) if city == "Atlantis"));
}

#[tokio::test]
async fn test_geocoder_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let result = geocoder_for(&mock_server).search("Paris").await;
    assert!(matches!(result, Err(GeocodeError::Status(429))));
}

#[tokio::test]
async fn test_open_city_in_maps_hands_off_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "lat": "41.0082", "lon": "28.9784" }
        ])))
        .mount(&mock_server)
        .await;

    let launcher = RecordingLauncher::default();
    let url = open_city_in_maps(&geocoder_for(&mock_server), &launcher, "Istanbul")
        .await
        .unwrap();

    assert!(url.contains("mlat=41.00820"));
    assert_eq!(launcher.opened.lock().as_slice(), &[url]);
}

#[tokio::test]
async fn test_open_city_in_maps_geocode_miss_launches_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let launcher = RecordingLauncher::default();
    let result = open_city_in_maps(&geocoder_for(&mock_server), &launcher, "Atlantis").await;

    assert!(matches!(result, Err(MapError::Geocode(GeocodeError::NotFound(_)))));
    assert!(launcher.opened.lock().is_empty());
}

#[tokio::test]
async fn test_ip_location_source_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": "203.0.113.9",
            "city": "Ankara",
            "latitude": 39.9199,
            "longitude": 32.8543
        })))
        .mount(&mock_server)
        .await;

    let source = IpLocationSource::new(format!("{}/json/", mock_server.uri())).unwrap();
    let loc = source.current_location().await.unwrap();
    assert_eq!(loc.city_name.as_deref(), Some("Ankara"));
    assert_eq!(loc.latitude, 39.9199);
}

#[tokio::test]
async fn test_ip_location_source_reports_refusal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": true,
            "reason": "RateLimited"
        })))
        .mount(&mock_server)
        .await;

    let source = IpLocationSource::new(mock_server.uri()).unwrap();
    let result = source.current_location().await;
    assert!(matches!(result, Err(LocationError::Other(reason)) if reason == "RateLimited"));
}

#[tokio::test]
async fn test_resolver_detects_via_ip_then_reverse_geocode() {
    let ip_server = MockServer::start().await;
    let geo_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "latitude": 38.4237,
            "longitude": 27.1428
        })))
        .mount(&ip_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "city": "İzmir" }
        })))
        .expect(1)
        .mount(&geo_server)
        .await;

    let source = IpLocationSource::new(ip_server.uri()).unwrap();
    let resolver = CityResolver::new(Some(Box::new(source)), geocoder_for(&geo_server), "Istanbul");

    let resolved = resolver.resolve(None).await;
    assert_eq!(resolved.name, "İzmir");
    assert_eq!(resolved.source, CitySource::Detected);
}

#[tokio::test]
async fn test_resolver_falls_back_when_lookup_fails() {
    let ip_server = MockServer::start().await;
    let geo_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ip_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&geo_server)
        .await;

    let source = IpLocationSource::new(ip_server.uri()).unwrap();
    let resolver = CityResolver::new(Some(Box::new(source)), geocoder_for(&geo_server), "Istanbul");

    let resolved = resolver.resolve(None).await;
    assert_eq!(resolved.name, "Istanbul");
    assert_eq!(resolved.source, CitySource::Fallback);
}
