//! Dining table entity.

pub mod model;
pub mod state;

pub use model::DiningTable;
pub use state::TableState;
