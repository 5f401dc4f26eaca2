#![allow(dead_code)]

use serde_json::{json, Value};

/// Trike record in the bundle's wire shape.
pub fn trike(id: &str, speed: f64, path: Value, events: Value) -> Value {
    json!({
        "id": id,
        "speed": speed,
        "createTime": 0,
        "path": path,
        "events": events,
    })
}

/// Passenger record with no expiry.
pub fn passenger(id: &str, src: [f64; 2], dest: [f64; 2], create_time: u64) -> Value {
    json!({
        "id": id,
        "src": src,
        "dest": dest,
        "createTime": create_time,
        "deathTime": -1,
    })
}

pub fn doc(trikes: Vec<Value>, passengers: Vec<Value>) -> Value {
    json!({ "trikes": trikes, "passengers": passengers })
}

/// One trike on a straight two-segment path, serving one passenger: appears
/// at frame 1, is dispatched at frame 2, picks up at frame 4 (the frame its
/// first unit segment completes at 0.01 units/ms), and drops off at frame 8
/// (the second segment's completion).
pub fn single_ride_doc() -> Value {
    let events = json!([
        {"type": "APPEAR", "time": 1, "location": [0.0, 0.0]},
        {"type": "ENQUEUE", "data": "passenger_1", "time": 2, "location": [0.0, 0.0]},
        {"type": "LOAD", "data": "passenger_1", "time": 4, "location": [0.0, 1.0]},
        {"type": "DROP-OFF", "data": "passenger_1", "time": 8, "location": [0.0, 2.0]},
    ]);
    doc(
        vec![trike(
            "trike_1",
            0.01,
            json!([[0.0, 0.0], [0.0, 1.0], [0.0, 2.0]]),
            events,
        )],
        vec![passenger("passenger_1", [0.0, 1.0], [0.0, 2.0], 0)],
    )
}
