use crate::ecs::PassengerStatus;
use crate::sink::{ConnectorKind, ConnectorLedger, PresentationSink};
use crate::store::EntityStore;

/// A trike delivering a passenger: the passenger completes, leaves the
/// trike's onboard set, and loses its destination connector line. An
/// untracked passenger means there is nothing to remove.
pub fn on_drop_off(
    trike_id: &str,
    passenger_id: &str,
    store: &mut EntityStore,
    ledger: &mut ConnectorLedger,
    sink: &dyn PresentationSink,
) {
    store.set_passenger_status(passenger_id, PassengerStatus::Completed);

    let mut onboard = store
        .trike_passengers(trike_id)
        .cloned()
        .unwrap_or_default();
    onboard.remove(passenger_id);
    store.record_trike_passengers(trike_id, onboard);

    if ledger.unlink_destination(passenger_id) {
        sink.on_connector_changed(ConnectorKind::Destination, passenger_id, None);
    }
}
