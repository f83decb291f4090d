//! Database repository implementations

pub mod lot_store;

pub use lot_store::SeaOrmLotStore;
