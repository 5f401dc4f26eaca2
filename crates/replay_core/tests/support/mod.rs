pub mod bundles;
pub mod world;
