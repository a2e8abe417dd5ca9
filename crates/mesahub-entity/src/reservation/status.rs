//! Reservation lifecycle states.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a reservation.
///
/// State names follow the store's Spanish-language values; they are
/// persisted as snake_case strings, not a database enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Newly entered, not yet reviewed.
    Pendiente,
    /// Waiting for the customer to confirm.
    PendienteConfirmacion,
    /// Confirmed by the customer or staff.
    Confirmada,
    /// The party has been seated.
    Sentada,
    /// The visit finished normally.
    Completada,
    /// Cancelled before the visit.
    Cancelada,
    /// The party never arrived.
    NoShow,
}

impl ReservationStatus {
    /// Parse from the stored string form.
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(Self::Pendiente),
            "pendiente_confirmacion" => Some(Self::PendienteConfirmacion),
            "confirmada" => Some(Self::Confirmada),
            "sentada" => Some(Self::Sentada),
            "completada" => Some(Self::Completada),
            "cancelada" => Some(Self::Cancelada),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::PendienteConfirmacion => "pendiente_confirmacion",
            Self::Confirmada => "confirmada",
            Self::Sentada => "sentada",
            Self::Completada => "completada",
            Self::Cancelada => "cancelada",
            Self::NoShow => "no_show",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip() {
        for s in [
            ReservationStatus::Pendiente,
            ReservationStatus::PendienteConfirmacion,
            ReservationStatus::Confirmada,
            ReservationStatus::Sentada,
            ReservationStatus::Completada,
            ReservationStatus::Cancelada,
            ReservationStatus::NoShow,
        ] {
            assert_eq!(ReservationStatus::from_str_value(s.as_str()), Some(s));
        }
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(ReservationStatus::from_str_value("en_espera"), None);
    }
}
