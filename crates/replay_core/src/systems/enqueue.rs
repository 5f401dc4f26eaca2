use crate::ecs::{PassengerStatus, TrikeStatus};
use crate::geo::Point;
use crate::sink::{ConnectorKind, ConnectorLedger, PresentationSink};
use crate::store::EntityStore;

/// A trike committing to a pickup: the passenger becomes enqueued, the trike
/// starts enqueueing, and two connector lines appear: pickup (trike to the
/// passenger's source) and destination (source to destination). Re-dispatch
/// for a passenger that already has its lines is idempotent; a passenger
/// poached from another trike gets its old pickup line dropped first.
pub fn on_enqueue(
    trike_id: &str,
    trike_position: Option<Point>,
    passenger_id: &str,
    store: &mut EntityStore,
    ledger: &mut ConnectorLedger,
    sink: &dyn PresentationSink,
) {
    let Some(passenger) = store.passenger(passenger_id) else {
        eprintln!(
            "WARNING: trike '{trike_id}': ENQUEUE for untracked passenger '{passenger_id}'"
        );
        return;
    };
    let src = passenger.src;
    let dest = passenger.dest;

    store.set_passenger_status(passenger_id, PassengerStatus::Enqueued);
    store.set_trike_status(trike_id, TrikeStatus::Enqueueing);

    if !ledger.has_enqueue_line(passenger_id, trike_id) {
        if let Some(displaced) = ledger.link_enqueue(passenger_id, trike_id) {
            sink.on_connector_changed(ConnectorKind::Enqueue, &displaced, None);
        }
        let anchor = trike_position.unwrap_or(src);
        sink.on_connector_changed(ConnectorKind::Enqueue, passenger_id, Some((anchor, src)));
    }
    if ledger.link_destination(passenger_id) {
        sink.on_connector_changed(ConnectorKind::Destination, passenger_id, Some((src, dest)));
    }
}
