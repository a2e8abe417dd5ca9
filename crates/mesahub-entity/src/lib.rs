//! # mesahub-entity
//!
//! Domain entity models for MesaHub: reservations, customers, dining
//! tables, and the durable notification record with its type catalog.

pub mod customer;
pub mod notification;
pub mod reservation;
pub mod table;
