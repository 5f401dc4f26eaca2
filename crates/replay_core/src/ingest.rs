//! Bundle ingestion: turns an opaque run identifier into validated trike,
//! passenger, and terminal records.
//!
//! The fetch side is a trait boundary ([`BundleSource`]) so the core never
//! knows where bundles come from; [`FileBundleSource`] reads them from disk.
//! Parsing is tolerant per record — a malformed trike, passenger, terminal,
//! point, or event is dropped with a warning and its siblings survive. Only
//! a transport failure or an unusable document aborts the load, leaving no
//! partial session behind.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::clock::Frame;
use crate::error::LoadError;
use crate::events::{parse_events, SimEvent};
use crate::geo::{sanitize_path, Point};
use crate::store::{Passenger, Terminal};

/// Raw trike record with its path validated but not yet positioned.
#[derive(Debug, Clone)]
pub struct TrikeSpec {
    pub id: String,
    pub speed: f64,
    pub create_time: Frame,
    pub path: Vec<Point>,
    pub events: Vec<SimEvent>,
}

/// Everything a replay session loads, validated and normalized.
#[derive(Debug, Clone, Default)]
pub struct SimulationBundle {
    pub trikes: Vec<TrikeSpec>,
    pub passengers: Vec<Passenger>,
    pub terminals: Vec<Terminal>,
    /// Free-form summary records, displayed verbatim.
    pub metadata: Vec<Value>,
}

/// External loader boundary: resolves a run identifier to the raw bundle
/// document.
pub trait BundleSource {
    fn fetch(&self, run_id: &str) -> Result<Value, LoadError>;
}

/// Reads `<root>/<run_id>.json`.
#[derive(Debug, Clone)]
pub struct FileBundleSource {
    root: PathBuf,
}

impl FileBundleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BundleSource for FileBundleSource {
    fn fetch(&self, run_id: &str) -> Result<Value, LoadError> {
        let path = self.root.join(format!("{run_id}.json"));
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Fetch and parse one run's bundle.
pub fn load_bundle(source: &dyn BundleSource, run_id: &str) -> Result<SimulationBundle, LoadError> {
    let doc = source.fetch(run_id)?;
    parse_bundle(&doc)
}

/// Parse a raw bundle document. The document must carry a `trikes` or a
/// `passengers` array; individual malformed records are skipped.
pub fn parse_bundle(doc: &Value) -> Result<SimulationBundle, LoadError> {
    let trikes_raw = doc.get("trikes").and_then(Value::as_array);
    let passengers_raw = doc.get("passengers").and_then(Value::as_array);
    if trikes_raw.is_none() && passengers_raw.is_none() {
        return Err(LoadError::MissingSection("trikes or passengers array"));
    }

    let trikes = trikes_raw
        .map(|items| items.iter().filter_map(parse_trike).collect())
        .unwrap_or_default();
    let passengers = passengers_raw
        .map(|items| items.iter().filter_map(parse_passenger).collect())
        .unwrap_or_default();
    let terminals = doc
        .get("terminals")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_terminal).collect())
        .unwrap_or_default();
    let metadata = doc
        .get("metadata")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(SimulationBundle {
        trikes,
        passengers,
        terminals,
        metadata,
    })
}

fn parse_trike(value: &Value) -> Option<TrikeSpec> {
    let obj = value.as_object().or_else(|| {
        eprintln!("WARNING: skipping non-object trike record");
        None
    })?;
    let Some(id) = obj.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) else {
        eprintln!("WARNING: skipping trike record without an id");
        return None;
    };
    let Some(speed) = obj.get("speed").and_then(Value::as_f64).filter(|s| s.is_finite()) else {
        eprintln!("WARNING: skipping trike '{id}': missing or malformed speed");
        return None;
    };
    let create_time = obj.get("createTime").and_then(Value::as_u64).unwrap_or(0);
    let path = obj
        .get("path")
        .and_then(Value::as_array)
        .map(|raw| sanitize_path(id, raw))
        .unwrap_or_default();
    let events = obj
        .get("events")
        .map(|raw| parse_events(id, raw))
        .unwrap_or_default();

    Some(TrikeSpec {
        id: id.to_owned(),
        speed,
        create_time,
        path,
        events,
    })
}

fn parse_passenger(value: &Value) -> Option<Passenger> {
    let obj = value.as_object().or_else(|| {
        eprintln!("WARNING: skipping non-object passenger record");
        None
    })?;
    let Some(id) = obj.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) else {
        eprintln!("WARNING: skipping passenger record without an id");
        return None;
    };
    let Some(src) = obj.get("src").and_then(|v| Point::from_wire(v)) else {
        eprintln!("WARNING: skipping passenger '{id}': malformed src point");
        return None;
    };
    let Some(dest) = obj.get("dest").and_then(|v| Point::from_wire(v)) else {
        eprintln!("WARNING: skipping passenger '{id}': malformed dest point");
        return None;
    };
    let create_time = obj.get("createTime").and_then(Value::as_u64).unwrap_or(0);
    let death_time = parse_death_time(obj.get("deathTime"));
    let events = obj
        .get("events")
        .map(|raw| parse_events(id, raw))
        .unwrap_or_default();

    Some(Passenger {
        id: id.to_owned(),
        src,
        dest,
        create_time,
        death_time,
        events,
    })
}

/// `deathTime == -1` means "never"; anything non-numeric or negative maps
/// the same way.
fn parse_death_time(value: Option<&Value>) -> Option<Frame> {
    value?.as_i64().and_then(|raw| u64::try_from(raw).ok())
}

fn parse_terminal(value: &Value) -> Option<Terminal> {
    let obj = value.as_object()?;
    let Some(id) = obj.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) else {
        eprintln!("WARNING: skipping terminal record without an id");
        return None;
    };
    let Some(location) = obj.get("location").and_then(|v| Point::from_wire(v)) else {
        eprintln!("WARNING: skipping terminal '{id}': malformed location");
        return None;
    };
    Some(Terminal {
        id: id.to_owned(),
        location,
        remaining_passengers: obj
            .get("remaining_passengers")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        remaining_tricycles: obj
            .get("remaining_tricycles")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    })
}
