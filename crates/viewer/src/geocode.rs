//! Free-text place lookup.
//!
//! `NominatimGeocoder` talks to an OpenStreetMap Nominatim endpoint directly;
//! `ProxyGeocoder` goes through this system's own `/api/geocode` route.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use crate::search::MAX_RESULTS;
use crate::state::GeocodingResult;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "PerspectiveMap/1.0";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub enum GeocodeError {
    Request(reqwest::Error),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::Request(e) => write!(f, "geocoder request failed: {e}"),
            GeocodeError::Status(code) => write!(f, "geocoder answered HTTP {code}"),
            GeocodeError::Decode(msg) => write!(f, "geocoder response unreadable: {msg}"),
        }
    }
}

impl std::error::Error for GeocodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeocodeError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        GeocodeError::Request(e)
    }
}

pub trait Geocoder: Send + Sync {
    /// At most the configured number of results, all with in-range coordinates.
    fn search(&self, query: &str) -> BoxFuture<'_, Result<Vec<GeocodingResult>, GeocodeError>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// Parse a Nominatim `format=json` body. Entries whose coordinates do not
/// parse or fall outside the valid ranges are dropped.
pub fn parse_nominatim(body: &str, limit: usize) -> Result<Vec<GeocodingResult>, GeocodeError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(e.to_string()))?;
    let results = places.into_iter().filter_map(|p| {
        Some(GeocodingResult {
            label: p.display_name,
            longitude: p.lon.trim().parse().ok()?,
            latitude: p.lat.trim().parse().ok()?,
        })
    });
    Ok(keep_valid(results, limit))
}

fn keep_valid(
    results: impl IntoIterator<Item = GeocodingResult>,
    limit: usize,
) -> Vec<GeocodingResult> {
    results
        .into_iter()
        .filter(GeocodingResult::has_valid_coordinates)
        .take(limit)
        .collect()
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    user_agent: String,
    limit: usize,
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            limit: MAX_RESULTS,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_RESULTS);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Geocoder for NominatimGeocoder {
    fn search(&self, query: &str) -> BoxFuture<'_, Result<Vec<GeocodingResult>, GeocodeError>> {
        let query = query.to_string();
        Box::pin(async move {
            let limit = self.limit.to_string();
            let resp = self
                .client
                .get(&self.endpoint)
                .query(&[("q", query.as_str()), ("format", "json"), ("limit", limit.as_str())])
                .header(USER_AGENT, &self.user_agent)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(GeocodeError::Status(resp.status().as_u16()));
            }
            let body = resp.text().await?;
            let results = parse_nominatim(&body, self.limit)?;
            debug!(%query, count = results.len(), "nominatim lookup");
            Ok(results)
        })
    }
}

/// Calls a PerspectiveMap server's `/api/geocode`.
#[derive(Debug, Clone)]
pub struct ProxyGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyGeocoder {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/api/geocode", self.base_url)
    }
}

impl Geocoder for ProxyGeocoder {
    fn search(&self, query: &str) -> BoxFuture<'_, Result<Vec<GeocodingResult>, GeocodeError>> {
        let query = query.to_string();
        Box::pin(async move {
            let resp = self
                .client
                .get(self.url())
                .query(&[("q", query.as_str())])
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(GeocodeError::Status(resp.status().as_u16()));
            }
            let results: Vec<GeocodingResult> = resp.json().await?;
            Ok(keep_valid(results, MAX_RESULTS))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_nominatim, GeocodeError, ProxyGeocoder};
    use crate::state::GeocodingResult;
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"[
        {"place_id": 1, "display_name": "Reykjavík, Iceland", "lat": "64.1466", "lon": "-21.9426"},
        {"display_name": "Broken", "lat": "north", "lon": "0"},
        {"display_name": "Nowhere", "lat": "95.0", "lon": "10"},
        {"display_name": "Nuuk, Greenland", "lat": "64.1835", "lon": "-51.7216"}
    ]"#;

    #[test]
    fn parses_string_coordinates_and_drops_bad_rows() {
        let results = parse_nominatim(BODY, 5).expect("parse");
        assert_eq!(
            results,
            vec![
                GeocodingResult {
                    label: "Reykjavík, Iceland".into(),
                    longitude: -21.9426,
                    latitude: 64.1466,
                },
                GeocodingResult {
                    label: "Nuuk, Greenland".into(),
                    longitude: -51.7216,
                    latitude: 64.1835,
                },
            ]
        );
    }

    #[test]
    fn honours_limit() {
        assert_eq!(parse_nominatim(BODY, 1).expect("parse").len(), 1);
        assert!(parse_nominatim("[]", 5).expect("parse").is_empty());
    }

    #[test]
    fn non_array_body_is_a_decode_error() {
        let err = parse_nominatim(r#"{"error": "rate limited"}"#, 5).unwrap_err();
        assert!(matches!(err, GeocodeError::Decode(_)));
        assert!(err.to_string().starts_with("geocoder response unreadable"));
    }

    #[test]
    fn proxy_url_has_no_double_slash() {
        let proxy = ProxyGeocoder::new(reqwest::Client::new(), "http://localhost:9200/");
        assert_eq!(proxy.url(), "http://localhost:9200/api/geocode");
    }
}
