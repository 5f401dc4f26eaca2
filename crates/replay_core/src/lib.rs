pub mod clock;
pub mod ecs;
pub mod error;
pub mod events;
pub mod geo;
pub mod ingest;
pub mod runner;
pub mod sink;
pub mod store;
pub mod systems;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
