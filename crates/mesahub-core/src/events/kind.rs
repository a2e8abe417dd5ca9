//! The closed set of domain event kinds.

use serde::{Deserialize, Serialize};

/// Every event the orchestrator can produce.
///
/// This enum is intentionally closed: adding a variant without a matching
/// arm in the taxonomy registry is a compile error there, never a silent
/// fallback at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A reservation appeared in the tracked collection.
    ReservationCreated,
    /// A reservation transitioned to `confirmada`.
    ReservationConfirmed,
    /// A reservation transitioned to `sentada`.
    ReservationSeated,
    /// A reservation transitioned to `completada`.
    ReservationCompleted,
    /// A reservation transitioned to `cancelada`.
    ReservationCancelled,
    /// A reservation transitioned to `no_show`.
    ReservationNoShow,
    /// One or more non-status fields of a reservation changed.
    ReservationModified,
    /// A confirmed reservation starts within the upcoming window.
    ReservationUpcoming,
    /// A dining table transitioned to `ocupada`.
    TableOccupied,
    /// A dining table transitioned to `libre`.
    TableFreed,
    /// An occupied table exceeded its allotted duration.
    TableOverstay,
    /// A customer appeared in the tracked collection.
    CustomerCreated,
    /// A customer's VIP flag changed.
    CustomerVipChanged,
}

impl EventKind {
    /// All members of the closed set, for totality checks in tests.
    pub const ALL: &'static [EventKind] = &[
        Self::ReservationCreated,
        Self::ReservationConfirmed,
        Self::ReservationSeated,
        Self::ReservationCompleted,
        Self::ReservationCancelled,
        Self::ReservationNoShow,
        Self::ReservationModified,
        Self::ReservationUpcoming,
        Self::TableOccupied,
        Self::TableFreed,
        Self::TableOverstay,
        Self::CustomerCreated,
        Self::CustomerVipChanged,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ReservationCreated => "reservation_created",
            Self::ReservationConfirmed => "reservation_confirmed",
            Self::ReservationSeated => "reservation_seated",
            Self::ReservationCompleted => "reservation_completed",
            Self::ReservationCancelled => "reservation_cancelled",
            Self::ReservationNoShow => "reservation_no_show",
            Self::ReservationModified => "reservation_modified",
            Self::ReservationUpcoming => "reservation_upcoming",
            Self::TableOccupied => "table_occupied",
            Self::TableFreed => "table_freed",
            Self::TableOverstay => "table_overstay",
            Self::CustomerCreated => "customer_created",
            Self::CustomerVipChanged => "customer_vip_changed",
        };
        write!(f, "{name}")
    }
}
