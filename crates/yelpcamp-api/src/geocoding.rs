use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use yelpcamp_types::models::Geometry;

/// Forward geocoding: free-text location to at most one point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means no match, which is not an error.
    async fn forward(&self, query: &str) -> Result<Option<Geometry>>;
}

/// Used when no geocoding provider is configured.
pub struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    async fn forward(&self, _query: &str) -> Result<Option<Geometry>> {
        Ok(None)
    }
}

const MAPBOX_API: &str = "https://api.mapbox.com";

pub struct MapboxGeocoder {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

impl MapboxGeocoder {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, MAPBOX_API.to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url,
        }
    }

    fn endpoint(&self, query: &str) -> Result<reqwest::Url> {
        let file = format!("{}.json", query);
        let mut url = reqwest::Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Geocoder base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", file.as_str()]);
        url.query_pairs_mut()
            .append_pair("access_token", &self.token)
            .append_pair("limit", "1");
        Ok(url)
    }
}

fn first_point(body: FeatureCollection) -> Option<Geometry> {
    body.features.into_iter().next().map(|f| f.geometry)
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward(&self, query: &str) -> Result<Option<Geometry>> {
        let body: FeatureCollection = self
            .client
            .get(self.endpoint(query)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let point = first_point(body);
        debug!("Geocoded {:?} -> {:?}", query, point);
        Ok(point)
    }
}
