//! Transit entity types and query filters.
//!
//! These are plain serde payloads: the cache and resilience layers never look
//! inside them. Field aliases absorb the camelCase spellings older provider
//! deployments still emit.

use serde::{Deserialize, Serialize};

/// Coarse transport-mode classification.
///
/// Mirrors the numeric route-type codes the provider uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitMode {
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
}

impl TransitMode {
    /// Map a provider route-type code to a mode, if it is one we classify.
    pub fn from_code(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Tram),
            1 => Some(Self::Subway),
            2 => Some(Self::Rail),
            3 => Some(Self::Bus),
            4 => Some(Self::Ferry),
            _ => None,
        }
    }

    /// Stable lowercase name, used in cache keys and query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tram => "tram",
            Self::Subway => "subway",
            Self::Rail => "rail",
            Self::Bus => "bus",
            Self::Ferry => "ferry",
        }
    }
}

/// A transit route (line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(alias = "shortName", default)]
    pub short_name: String,
    #[serde(alias = "longName", default)]
    pub long_name: String,
    /// Raw provider route-type code; see [`TransitMode::from_code`].
    #[serde(alias = "routeType", default)]
    pub route_type: u16,
    #[serde(default)]
    pub color: Option<String>,
}

impl Route {
    pub fn mode(&self) -> Option<TransitMode> {
        TransitMode::from_code(self.route_type)
    }
}

/// A stop or station served by one or more routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
    /// Routes serving this stop, by id.
    #[serde(alias = "routeIds", default)]
    pub route_ids: Vec<String>,
}

/// A live vehicle position report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    #[serde(alias = "routeId")]
    pub route_id: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
    /// Heading in degrees clockwise from north, when reported.
    #[serde(default)]
    pub bearing: Option<f32>,
    /// Unix seconds of the position fix.
    #[serde(alias = "updatedAt", default)]
    pub updated_at: Option<u64>,
}

/// One scheduled stop event (arrival and departure at a stop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(alias = "tripId")]
    pub trip_id: String,
    #[serde(alias = "routeId")]
    pub route_id: String,
    #[serde(alias = "stopId")]
    pub stop_id: String,
    /// Unix seconds.
    #[serde(alias = "arrivalTime")]
    pub arrival_epoch: u64,
    /// Unix seconds.
    #[serde(alias = "departureTime")]
    pub departure_epoch: u64,
}

/// A WGS84 coordinate supplied by callers as plain values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Filter parameters for stop queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopFilter {
    /// Restrict to stops served by this route.
    pub route_id: Option<String>,
    /// Center of a radius search.
    pub center: Option<GeoPoint>,
    /// Radius in meters around `center`.
    pub radius_m: Option<u32>,
}

impl StopFilter {
    /// Deterministic fragment for cache-key construction.
    pub fn cache_part(&self) -> String {
        let mut parts = Vec::new();
        if let Some(route_id) = &self.route_id {
            parts.push(format!("route={}", route_id));
        }
        if let Some(center) = &self.center {
            parts.push(format!("near={},{}", center.lat, center.lon));
        }
        if let Some(radius) = self.radius_m {
            parts.push(format!("r={}", radius));
        }
        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join(":")
        }
    }

    /// Query parameters for the provider request.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(route_id) = &self.route_id {
            query.push(("route_id", route_id.clone()));
        }
        if let Some(center) = &self.center {
            query.push(("lat", center.lat.to_string()));
            query.push(("lon", center.lon.to_string()));
        }
        if let Some(radius) = self.radius_m {
            query.push(("radius", radius.to_string()));
        }
        query
    }
}

/// Filter parameters for vehicle queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    pub route_id: Option<String>,
    pub mode: Option<TransitMode>,
}

impl VehicleFilter {
    pub fn cache_part(&self) -> String {
        let mut parts = Vec::new();
        if let Some(route_id) = &self.route_id {
            parts.push(format!("route={}", route_id));
        }
        if let Some(mode) = self.mode {
            parts.push(format!("mode={}", mode.as_str()));
        }
        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join(":")
        }
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(route_id) = &self.route_id {
            query.push(("route_id", route_id.clone()));
        }
        if let Some(mode) = self.mode {
            query.push(("mode", mode.as_str().to_string()));
        }
        query
    }
}

/// A half-open time window in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from_epoch: u64,
    pub to_epoch: u64,
}

impl TimeWindow {
    pub fn cache_part(&self) -> String {
        format!("{}-{}", self.from_epoch, self.to_epoch)
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("from", self.from_epoch.to_string()),
            ("to", self.to_epoch.to_string()),
        ]
    }
}
