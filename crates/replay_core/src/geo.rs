//! Geometry primitives: lng/lat points, Euclidean distance, linear
//! interpolation, and normalization of the two wire shapes a point can
//! arrive in (a raw `[lng, lat]` pair or `{"type": "point", "data": [lng, lat]}`).
//!
//! Normalization here is the only place the wire shapes are handled; every
//! point the rest of the crate consumes is a finite coordinate pair.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A map coordinate as (longitude, latitude).
///
/// Wire input goes through [`Point::from_wire`], which rejects non-finite
/// components; points built in code use [`Point::new`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lng: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build a point from untrusted input, rejecting NaN and infinity.
    pub fn checked(lng: f64, lat: f64) -> Option<Self> {
        if lng.is_finite() && lat.is_finite() {
            Some(Self { lng, lat })
        } else {
            None
        }
    }

    /// Normalize a wire-format point. Accepts a raw two-element numeric
    /// array or the tagged `{"type": "point", "data": [lng, lat]}` wrapper.
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => {
                if items.len() != 2 {
                    return None;
                }
                let lng = items[0].as_f64()?;
                let lat = items[1].as_f64()?;
                Self::checked(lng, lat)
            }
            Value::Object(map) => {
                if let Some(kind) = map.get("type").and_then(Value::as_str) {
                    if kind != "point" {
                        return None;
                    }
                }
                Self::from_wire(map.get("data")?)
            }
            _ => None,
        }
    }

    /// Euclidean distance in coordinate units.
    pub fn distance(self, other: Point) -> f64 {
        let dx = other.lng - self.lng;
        let dy = other.lat - self.lat;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation from `self` toward `other`; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Point, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        Point {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

/// Normalize a raw path, dropping malformed entries instead of failing the
/// owner. Emits one warning per dropped entry.
pub fn sanitize_path(owner: &str, raw: &[Value]) -> Vec<Point> {
    let mut path = Vec::with_capacity(raw.len());
    for value in raw {
        match Point::from_wire(value) {
            Some(point) => path.push(point),
            None => eprintln!("WARNING: {owner}: dropping malformed path point {value}"),
        }
    }
    path
}
