//! # mesahub-store
//!
//! Store clients for MesaHub. The orchestrator consumes the remote data
//! store only through the [`traits::NotificationStore`] and
//! [`traits::EntityGateway`] seams; this crate provides the PostgreSQL
//! implementation used in production and an in-memory implementation used
//! by tests and local development.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{EntityCollection, EntityGateway, NotificationFilter, NotificationStore, StoreChange};
