// feeds.rs

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use geojson::{Feature, GeoJson, Value};
use serde_json::Value as JsonValue;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const USGS_ALL_WEEK_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";
pub const PB2002_BOUNDARIES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// Where a GeoJSON document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    Url(String),
    File(PathBuf),
}

impl FeedSource {
    pub fn parse(raw: &str) -> FeedSource {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            FeedSource::Url(raw.to_string())
        } else {
            FeedSource::File(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Url(url) => write!(f, "{}", url),
            FeedSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Downloads or reads a GeoJSON document.
pub fn fetch_geojson(source: &FeedSource, timeout: Duration) -> Result<GeoJson> {
    debug!(%source, "fetching feed");
    let geojson = match source {
        FeedSource::Url(url) => {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .context("failed to build HTTP client")?;
            let body = client
                .get(url)
                .send()
                .with_context(|| format!("request to {} failed", url))?
                .error_for_status()
                .with_context(|| format!("{} responded with an error status", url))?
                .text()
                .with_context(|| format!("failed to read response body from {}", url))?;
            body.parse::<GeoJson>()
                .with_context(|| format!("{} is not valid GeoJSON", url))?
        }
        FeedSource::File(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let reader = io::BufReader::new(file);
            GeoJson::from_reader(reader)
                .with_context(|| format!("{} is not valid GeoJSON", path.display()))?
        }
    };
    info!(%source, "feed loaded");
    Ok(geojson)
}

/// Flattens any GeoJSON document into its features.
pub fn into_features(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    }
}

/// Non-null property value of a feature.
fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a JsonValue> {
    feature.property(key).filter(|v| !v.is_null())
}

#[derive(Debug, Clone)]
pub struct Earthquake {
    pub place: String,
    pub time: Option<DateTime<Utc>>,
    pub magnitude: Option<f64>,
    pub longitude: f64,
    pub latitude: f64,
    pub depth: Option<f64>, // km
}

impl Earthquake {
    /// Reads an earthquake from a USGS point feature. Returns `None` for
    /// features without point geometry.
    pub fn from_feature(feature: &Feature) -> Option<Earthquake> {
        let geometry = feature.geometry.as_ref()?;
        let coords = match &geometry.value {
            Value::Point(c) if c.len() >= 2 => c,
            _ => return None,
        };

        let place = property(feature, "place")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown location")
            .to_string();
        let time = property(feature, "time")
            .and_then(|v| v.as_i64())
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        let magnitude = property(feature, "mag").and_then(|v| v.as_f64());

        Some(Earthquake {
            place,
            time,
            magnitude,
            longitude: coords[0],
            latitude: coords[1],
            depth: coords.get(2).copied(),
        })
    }

    /// Text shown in the marker popup.
    pub fn popup(&self) -> Popup {
        let time = match self.time {
            Some(t) => t.format("%a %b %d %Y %H:%M:%S UTC").to_string(),
            None => "Unknown time".to_string(),
        };
        let magnitude = match self.magnitude {
            Some(m) => format!("Magnitude: {}", m),
            None => "Magnitude: unknown".to_string(),
        };
        let depth = match self.depth {
            Some(d) => format!("Depth: {}", d),
            None => "Depth: unknown".to_string(),
        };
        Popup {
            title: self.place.clone(),
            lines: vec![time, magnitude, depth],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<String>,
}

/// Extracts earthquakes from a feed, returning them with the number of
/// features that had to be skipped.
pub fn parse_earthquakes(geojson: GeoJson) -> Result<(Vec<Earthquake>, usize)> {
    if let GeoJson::Geometry(_) = geojson {
        bail!("earthquake feed must contain features, found a bare geometry");
    }
    let features = into_features(geojson);
    let total = features.len();
    let quakes: Vec<Earthquake> = features.iter().filter_map(Earthquake::from_feature).collect();
    let skipped = total - quakes.len();
    if skipped > 0 {
        debug!(skipped, "features without point geometry ignored");
    }
    Ok((quakes, skipped))
}
