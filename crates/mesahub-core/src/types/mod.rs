//! Shared value types used across MesaHub crates.

pub mod id;
