use crate::ecs::PassengerStatus;
use crate::sink::{ConnectorKind, ConnectorLedger, PresentationSink};
use crate::store::EntityStore;

/// A trike picking up a passenger: the passenger goes onboard, joins the
/// trike's onboard set, and loses its pickup connector line.
pub fn on_load(
    trike_id: &str,
    passenger_id: &str,
    store: &mut EntityStore,
    ledger: &mut ConnectorLedger,
    sink: &dyn PresentationSink,
) {
    if store.passenger(passenger_id).is_none() {
        eprintln!("WARNING: trike '{trike_id}': LOAD for untracked passenger '{passenger_id}'");
        return;
    }
    store.set_passenger_status(passenger_id, PassengerStatus::Onboard);

    let mut onboard = store
        .trike_passengers(trike_id)
        .cloned()
        .unwrap_or_default();
    onboard.insert(passenger_id.to_owned());
    store.record_trike_passengers(trike_id, onboard);

    if ledger.unlink_enqueue(passenger_id).is_some() {
        sink.on_connector_changed(ConnectorKind::Enqueue, passenger_id, None);
    }
}
