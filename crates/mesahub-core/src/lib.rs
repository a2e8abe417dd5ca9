//! # mesahub-core
//!
//! Core crate for the MesaHub back-office platform. Contains configuration
//! schemas, typed identifiers, the domain-event taxonomy consumed by the
//! notification orchestrator, and the unified error system.
//!
//! This crate has **no** internal dependencies on other MesaHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
