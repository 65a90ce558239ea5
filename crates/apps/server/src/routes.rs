use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use foundation::math::{LonLat, Vec2};
use foundation::Viewport;
use layers::TissotGrid;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use viewer::search::MAX_RESULTS;
use viewer::{invert_point, render_svg, GeocodingResult, Geocoder, MapControls, MapKind, WorldCache};

const GEOJSON: &str = "application/geo+json";
const JSON: &str = "application/json";
const SVG: &str = "image/svg+xml";
const MAX_SIDE_PX: f64 = 4096.0;

#[derive(Clone)]
pub struct AppState {
    pub geocoder: Arc<dyn Geocoder>,
    pub world: Arc<WorldCache>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/geocode", get(geocode))
        .route("/api/world", get(world))
        .route("/api/tissot", get(tissot))
        .route("/api/invert/:kind", get(invert))
        .route("/render/:kind", get(render))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

#[derive(Debug, Deserialize)]
struct GeocodeParams {
    q: Option<String>,
}

async fn geocode(State(state): State<AppState>, Query(params): Query<GeocodeParams>) -> Response {
    let none: [GeocodingResult; 0] = [];
    let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return json_response(StatusCode::BAD_REQUEST, &none);
    };
    match state.geocoder.search(query).await {
        Ok(mut results) => {
            results.retain(GeocodingResult::has_valid_coordinates);
            results.truncate(MAX_RESULTS);
            debug!(query, count = results.len(), "geocode");
            json_response(StatusCode::OK, &results)
        }
        Err(err) => {
            error!(query, "geocode failed: {err}");
            json_response(StatusCode::BAD_GATEWAY, &none)
        }
    }
}

async fn world(State(state): State<AppState>) -> Response {
    let world = state.world.load_or_empty().await;
    match world.to_geojson_string() {
        Ok(body) => with_content_type(StatusCode::OK, GEOJSON, body),
        Err(err) => {
            error!("failed to encode world: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "world encoding error").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct TissotParams {
    spacing: Option<f64>,
    radius: Option<f64>,
}

async fn tissot(Query(params): Query<TissotParams>) -> Response {
    let grid = match grid_from(params.spacing, params.radius) {
        Ok(grid) => grid,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    match grid.to_feature_collection().to_geojson_string() {
        Ok(body) => with_content_type(StatusCode::OK, GEOJSON, body),
        Err(err) => {
            error!("failed to encode indicators: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "tissot encoding error").into_response()
        }
    }
}

fn grid_from(spacing: Option<f64>, radius: Option<f64>) -> Result<TissotGrid, &'static str> {
    let default = TissotGrid::default();
    let spacing = spacing.unwrap_or(default.lat_spacing);
    let radius = radius.unwrap_or(default.radius);
    if !spacing.is_finite() || spacing <= 0.0 || spacing > 180.0 {
        return Err("spacing must be in (0, 180]");
    }
    if !radius.is_finite() || radius <= 0.0 || radius >= 90.0 {
        return Err("radius must be in (0, 90)");
    }
    Ok(TissotGrid::uniform(spacing, radius))
}

#[derive(Debug, Deserialize)]
struct RenderParams {
    lon: Option<f64>,
    lat: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    tissot: Option<bool>,
    graticule: Option<bool>,
    spacing: Option<f64>,
    radius: Option<f64>,
}

async fn render(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<RenderParams>,
) -> Response {
    let Some(kind) = MapKind::parse(&kind) else {
        return (StatusCode::NOT_FOUND, "unknown map kind").into_response();
    };
    let viewport = match viewport_from(params.width, params.height) {
        Ok(viewport) => viewport,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    let center = match center_from(params.lon, params.lat) {
        Ok(center) => center,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    let grid = match grid_from(params.spacing, params.radius) {
        Ok(grid) => grid,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    let defaults = MapControls::default();
    let controls = MapControls {
        show_tissot: params.tissot.unwrap_or(defaults.show_tissot),
        show_graticule: params.graticule.unwrap_or(defaults.show_graticule),
    };

    let world = state.world.load_or_empty().await;
    let svg = render_svg(kind, viewport, center, controls, grid, world);
    with_content_type(StatusCode::OK, SVG, svg)
}

#[derive(Debug, Deserialize)]
struct InvertParams {
    x: f64,
    y: f64,
    width: Option<f64>,
    height: Option<f64>,
    lon: Option<f64>,
    lat: Option<f64>,
}

#[derive(Debug, Serialize)]
struct InvertedPoint {
    longitude: f64,
    latitude: f64,
}

async fn invert(Path(kind): Path<String>, Query(params): Query<InvertParams>) -> Response {
    let Some(kind) = MapKind::parse(&kind) else {
        return (StatusCode::NOT_FOUND, "unknown map kind").into_response();
    };
    let viewport = match viewport_from(params.width, params.height) {
        Ok(viewport) => viewport,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    let center = match center_from(params.lon, params.lat) {
        Ok(center) => center,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };
    match invert_point(kind, viewport, center, Vec2::new(params.x, params.y)) {
        Some(hit) => json_response(
            StatusCode::OK,
            &InvertedPoint {
                longitude: hit.lon,
                latitude: hit.lat,
            },
        ),
        None => json_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &json!({ "error": "point is outside the map" }),
        ),
    }
}

fn viewport_from(width: Option<f64>, height: Option<f64>) -> Result<Viewport, &'static str> {
    let default = Viewport::default();
    let width = width.unwrap_or(default.width);
    let height = height.unwrap_or(default.height);
    let valid = |side: f64| side.is_finite() && (1.0..=MAX_SIDE_PX).contains(&side);
    if !valid(width) || !valid(height) {
        return Err("width and height must be between 1 and 4096");
    }
    Ok(Viewport::new(width, height))
}

fn center_from(lon: Option<f64>, lat: Option<f64>) -> Result<LonLat, &'static str> {
    let lon = lon.unwrap_or(0.0);
    let lat = lat.unwrap_or(0.0);
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
        return Err("lat must be within [-90, 90] and lon finite");
    }
    Ok(LonLat::new(lon, lat))
}

fn with_content_type(status: StatusCode, content_type: &'static str, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(content_type),
    );
    (status, headers, Body::from(body)).into_response()
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => with_content_type(status, JSON, body),
        Err(err) => {
            error!("failed to encode response: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "encoding error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tower::ServiceExt;
    use viewer::geocode::BoxFuture;
    use viewer::world::BundledSource;
    use viewer::{GeocodeError, GeocodingResult, Geocoder, WorldCache, WorldSource};

    use super::{router, AppState};

    const FIXTURE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../formats/tests/fixtures/two-countries.topo.json"
    );

    enum FakeGeocoder {
        Places(Vec<GeocodingResult>),
        Down,
    }

    impl Geocoder for FakeGeocoder {
        fn search(&self, _query: &str) -> BoxFuture<'_, Result<Vec<GeocodingResult>, GeocodeError>> {
            Box::pin(async move {
                match self {
                    FakeGeocoder::Places(places) => Ok(places.clone()),
                    FakeGeocoder::Down => Err(GeocodeError::Status(503)),
                }
            })
        }
    }

    fn place(label: &str, longitude: f64, latitude: f64) -> GeocodingResult {
        GeocodingResult {
            label: label.to_string(),
            longitude,
            latitude,
        }
    }

    fn app(geocoder: FakeGeocoder) -> Router {
        let bundled: Arc<dyn WorldSource> = Arc::new(BundledSource::new(FIXTURE));
        router(AppState {
            geocoder: Arc::new(geocoder),
            world: Arc::new(WorldCache::new(vec![bundled])),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (status, _, body) = get(app(FakeGeocoder::Down), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn blank_query_is_rejected_with_empty_list() {
        for uri in ["/api/geocode", "/api/geocode?q=", "/api/geocode?q=%20%20"] {
            let (status, _, body) = get(app(FakeGeocoder::Places(vec![])), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, "[]");
        }
    }

    #[tokio::test]
    async fn geocode_filters_and_caps_results() {
        let mut places = vec![place("Off the map", 10.0, 120.0)];
        places.extend((0..7).map(|i| place(&format!("Lagos {i}"), 3.4, 6.5)));
        let (status, content_type, body) =
            get(app(FakeGeocoder::Places(places)), "/api/geocode?q=Lagos").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let results: Vec<GeocodingResult> = serde_json::from_str(&body).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0], place("Lagos 0", 3.4, 6.5));
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let (status, _, body) = get(app(FakeGeocoder::Down), "/api/geocode?q=Quito").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn world_serves_the_bundled_countries() {
        let (status, content_type, body) = get(app(FakeGeocoder::Down), "/api/world").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/geo+json"));
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn tissot_grid_as_geojson() {
        let (status, _, body) = get(app(FakeGeocoder::Down), "/api/tissot").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["features"].as_array().map(Vec::len), Some(162));

        let (status, _, _) = get(app(FakeGeocoder::Down), "/api/tissot?spacing=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn render_returns_svg() {
        let (status, content_type, body) = get(
            app(FakeGeocoder::Down),
            "/render/equal-area?lon=-74&lat=40.7&width=420&height=420&tissot=true",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/svg+xml"));
        assert!(body.starts_with("<svg"));
        assert!(body.contains(r#"class="land""#));

        let (status, _, _) = get(app(FakeGeocoder::Down), "/render/robinson").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = get(app(FakeGeocoder::Down), "/render/mercator?lat=91").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invert_maps_screen_points() {
        let (status, _, body) = get(
            app(FakeGeocoder::Down),
            "/api/invert/mercator?x=300&y=200&width=600&height=400&lon=45",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert!((value["longitude"].as_f64().unwrap() - 45.0).abs() < 1e-9);
        assert!(value["latitude"].as_f64().unwrap().abs() < 1e-9);

        let (status, _, _) = get(
            app(FakeGeocoder::Down),
            "/api/invert/equal-area?x=0&y=0&width=400&height=400",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
