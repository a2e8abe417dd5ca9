//! Dining table occupancy states.

use serde::{Deserialize, Serialize};

/// Occupancy state of a dining table on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    /// Free and available.
    Libre,
    /// Held for an incoming reservation.
    Reservada,
    /// Currently occupied by a party.
    Ocupada,
    /// Taken out of service.
    Bloqueada,
}

impl TableState {
    /// Parse from the stored string form.
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "libre" => Some(Self::Libre),
            "reservada" => Some(Self::Reservada),
            "ocupada" => Some(Self::Ocupada),
            "bloqueada" => Some(Self::Bloqueada),
            _ => None,
        }
    }

    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Libre => "libre",
            Self::Reservada => "reservada",
            Self::Ocupada => "ocupada",
            Self::Bloqueada => "bloqueada",
        }
    }
}

impl std::fmt::Display for TableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
