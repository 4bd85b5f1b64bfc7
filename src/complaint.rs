//! Complaint records as the complaint store serves them.
//!
//! The store keeps `route_coords` as a JSON-encoded string of `[lng, lat]`
//! pairs (or null when no route has been registered yet). Ids arrive as
//! numbers from the database but are treated as opaque strings here.
//!
//! Rows are read leniently: a record always deserializes, whatever shape the
//! row has, and problems surface per record from [`ComplaintRecord::into_path`].
//! Coordinates sent as numeric strings (DECIMAL columns) are accepted.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{parse_category, parse_danger_level, DangerMapError, DangerPath, GeoPoint, Result};

/// A raw complaint row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ComplaintRecord {
    /// `None` when the row has no usable id.
    pub id: Option<String>,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    /// JSON string or inline array of `[lng, lat]` pairs.
    pub route_coords: Option<Value>,
    pub category: Option<String>,
    pub danger_level: Option<String>,
    pub reason: Option<String>,
    pub created_at: Option<String>,
}

impl From<Value> for ComplaintRecord {
    fn from(value: Value) -> Self {
        let Value::Object(row) = value else {
            return Self::default();
        };
        Self {
            id: row.get("id").and_then(lenient_id),
            start_lat: lenient_f64(&row, "start_lat"),
            start_lng: lenient_f64(&row, "start_lng"),
            end_lat: lenient_f64(&row, "end_lat"),
            end_lng: lenient_f64(&row, "end_lng"),
            route_coords: row.get("route_coords").filter(|v| !v.is_null()).cloned(),
            category: lenient_text(&row, "category"),
            danger_level: lenient_text(&row, "danger_level"),
            reason: lenient_text(&row, "reason"),
            created_at: lenient_text(&row, "created_at"),
        }
    }
}

/// Integer ids become their decimal text; fractional ids are rejected.
fn lenient_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn lenient_f64(row: &Map<String, Value>, key: &str) -> Option<f64> {
    let parsed = match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn lenient_text(row: &Map<String, Value>, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ComplaintRecord {
    /// Decode into a [`DangerPath`].
    ///
    /// A null, missing, or empty `route_coords` leaves `coords` unset so the
    /// resolver will route it. A row without an id is
    /// [`DangerMapError::MalformedRecord`]. Missing or out-of-range endpoints,
    /// or a `route_coords` that is not a list of valid `[lng, lat]` pairs, is
    /// [`DangerMapError::MalformedCoordinates`].
    pub fn into_path(self) -> Result<DangerPath> {
        let Some(id) = self.id else {
            return Err(DangerMapError::MalformedRecord {
                reason: "missing or non-integer id".to_string(),
            });
        };

        let start = endpoint(&id, "start", self.start_lat, self.start_lng)?;
        let end = endpoint(&id, "end", self.end_lat, self.end_lng)?;

        let coords = match &self.route_coords {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(parse_route_coords(&id, s)?),
            Some(value @ Value::Array(_)) => Some(coords_from_value(&id, value)?),
            Some(other) => {
                return Err(DangerMapError::MalformedCoordinates {
                    path_id: id,
                    reason: format!("expected string or array, got {other}"),
                })
            }
        }
        .filter(|c| !c.is_empty());

        let category = self.category.as_deref().and_then(|raw| {
            let parsed = parse_category(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                debug!("[Complaint {}] Unrecognised category {:?}", id, raw);
            }
            parsed
        });

        Ok(DangerPath {
            start,
            end,
            coords,
            category,
            danger_level: self.danger_level.as_deref().and_then(parse_danger_level),
            reason: self.reason.unwrap_or_default(),
            created_at: self.created_at,
            id,
        })
    }
}

fn endpoint(path_id: &str, which: &str, lat: Option<f64>, lng: Option<f64>) -> Result<GeoPoint> {
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Err(DangerMapError::MalformedCoordinates {
            path_id: path_id.to_string(),
            reason: format!("missing or non-numeric {which} point"),
        });
    };
    let point = GeoPoint::new(lat, lng);
    if !point.is_valid() {
        return Err(DangerMapError::MalformedCoordinates {
            path_id: path_id.to_string(),
            reason: format!("out of range {which} point ({lat}, {lng})"),
        });
    }
    Ok(point)
}

/// Parse a JSON-encoded `[[lng, lat], ...]` coordinate string.
///
/// # Example
/// ```
/// use danger_paths::parse_route_coords;
///
/// let coords = parse_route_coords("7", "[[128.486, 35.854], [128.487, 35.855]]").unwrap();
/// assert_eq!(coords.len(), 2);
/// assert_eq!(coords[0].latitude, 35.854);
///
/// assert!(parse_route_coords("7", "not json").is_err());
/// ```
pub fn parse_route_coords(path_id: &str, raw: &str) -> Result<Vec<GeoPoint>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DangerMapError::MalformedCoordinates {
            path_id: path_id.to_string(),
            reason: e.to_string(),
        })?;
    coords_from_value(path_id, &value)
}

fn coords_from_value(path_id: &str, value: &Value) -> Result<Vec<GeoPoint>> {
    let pairs: Vec<[f64; 2]> =
        serde_json::from_value(value.clone()).map_err(|e| DangerMapError::MalformedCoordinates {
            path_id: path_id.to_string(),
            reason: e.to_string(),
        })?;

    let points: Vec<GeoPoint> = pairs.into_iter().map(GeoPoint::from_lng_lat).collect();
    if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
        return Err(DangerMapError::MalformedCoordinates {
            path_id: path_id.to_string(),
            reason: format!("out of range point [{}, {}]", bad.longitude, bad.latitude),
        });
    }
    Ok(points)
}

/// Decode a batch of records, dropping malformed ones.
///
/// Returns the decoded paths in input order and one diagnostic per dropped
/// record.
pub fn decode_complaints(records: Vec<ComplaintRecord>) -> (Vec<DangerPath>, Vec<DangerMapError>) {
    let mut paths = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (row, record) in records.into_iter().enumerate() {
        match record.into_path() {
            Ok(path) => paths.push(path),
            Err(e) => {
                warn!("[Complaint] Dropping row {}: {}", row, e);
                failures.push(e);
            }
        }
    }

    (paths, failures)
}
