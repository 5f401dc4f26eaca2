use crate::geo::Point;
use crate::sink::PresentationSink;

/// A trike entering the map at its scheduled frame. State-wise this is a
/// no-op; the sink gets told so presentation can place the marker.
pub fn on_trike_appear(trike_id: &str, location: Point, sink: &dyn PresentationSink) {
    sink.on_entity_appear(trike_id, location, "trike");
}
