//! `Snapshotted` implementations for the tracked collections, plus the
//! per-entity status-to-event lookup tables and payload builders.

use serde_json::{Map, Value, json};

use mesahub_core::events::{DomainEvent, EventKind, RelatedEntityIds};
use mesahub_entity::customer::Customer;
use mesahub_entity::reservation::{Reservation, ReservationStatus};
use mesahub_entity::table::{DiningTable, TableState};

use super::Snapshotted;

/// Render-time payload for a reservation.
pub fn reservation_payload(reservation: &Reservation) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        "customer_name".into(),
        Value::String(reservation.customer_name.clone()),
    );
    payload.insert("party_size".into(), json!(reservation.party_size));
    payload.insert(
        "starts_at".into(),
        Value::String(reservation.starts_at.format("%H:%M").to_string()),
    );
    payload.insert(
        "status".into(),
        Value::String(reservation.status.as_str().to_string()),
    );
    if let Some(notes) = &reservation.notes {
        payload.insert("notes".into(), Value::String(notes.clone()));
    }
    payload
}

fn reservation_related(reservation: &Reservation) -> RelatedEntityIds {
    let mut related = RelatedEntityIds::reservation(reservation.id);
    if let Some(customer_id) = reservation.customer_id {
        related = related.with_customer(customer_id);
    }
    if let Some(table_id) = reservation.table_id {
        related = related.with_table(table_id);
    }
    related
}

/// Status-to-event lookup for reservations. Transitions into statuses
/// without an entry (`pendiente`, `pendiente_confirmacion`) are silently
/// ignored by design.
fn reservation_transition_kind(status: ReservationStatus) -> Option<EventKind> {
    match status {
        ReservationStatus::Confirmada => Some(EventKind::ReservationConfirmed),
        ReservationStatus::Sentada => Some(EventKind::ReservationSeated),
        ReservationStatus::Completada => Some(EventKind::ReservationCompleted),
        ReservationStatus::Cancelada => Some(EventKind::ReservationCancelled),
        ReservationStatus::NoShow => Some(EventKind::ReservationNoShow),
        ReservationStatus::Pendiente | ReservationStatus::PendienteConfirmacion => None,
    }
}

impl Snapshotted for Reservation {
    type Id = mesahub_core::types::id::ReservationId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_event(&self) -> Option<DomainEvent> {
        Some(DomainEvent::new(
            EventKind::ReservationCreated,
            reservation_payload(self),
            reservation_related(self),
        ))
    }

    fn status_changed(&self, previous: &Self) -> bool {
        self.status != previous.status
    }

    fn transition_event(&self, _previous: &Self) -> Option<DomainEvent> {
        reservation_transition_kind(self.status).map(|kind| {
            DomainEvent::new(kind, reservation_payload(self), reservation_related(self))
        })
    }

    fn changed_fields(&self, previous: &Self) -> Map<String, Value> {
        let mut changes = Map::new();
        if self.notes != previous.notes {
            changes.insert(
                "notes".into(),
                json!({"old": previous.notes, "new": self.notes}),
            );
        }
        if self.party_size != previous.party_size {
            changes.insert(
                "party_size".into(),
                json!({"old": previous.party_size, "new": self.party_size}),
            );
        }
        if self.starts_at != previous.starts_at {
            changes.insert(
                "starts_at".into(),
                json!({"old": previous.starts_at, "new": self.starts_at}),
            );
        }
        if self.table_id != previous.table_id {
            changes.insert(
                "table_id".into(),
                json!({"old": previous.table_id, "new": self.table_id}),
            );
        }
        if self.customer_name != previous.customer_name {
            changes.insert(
                "customer_name".into(),
                json!({"old": previous.customer_name, "new": self.customer_name}),
            );
        }
        changes
    }

    fn modified_event(&self, changes: Map<String, Value>) -> Option<DomainEvent> {
        let mut payload = reservation_payload(self);
        payload.insert("changes".into(), Value::Object(changes));
        Some(DomainEvent::new(
            EventKind::ReservationModified,
            payload,
            reservation_related(self),
        ))
    }
}

fn customer_payload(customer: &Customer) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        "full_name".into(),
        Value::String(customer.full_name.clone()),
    );
    payload.insert("is_vip".into(), Value::Bool(customer.is_vip));
    payload.insert("visit_count".into(), json!(customer.visit_count));
    payload
}

impl Snapshotted for Customer {
    type Id = mesahub_core::types::id::CustomerId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_event(&self) -> Option<DomainEvent> {
        Some(DomainEvent::new(
            EventKind::CustomerCreated,
            customer_payload(self),
            RelatedEntityIds::customer(self.id),
        ))
    }

    // The VIP flag is the customer's designated status field.
    fn status_changed(&self, previous: &Self) -> bool {
        self.is_vip != previous.is_vip
    }

    fn transition_event(&self, _previous: &Self) -> Option<DomainEvent> {
        let mut payload = customer_payload(self);
        payload.insert(
            "vip_status".into(),
            Value::String(
                if self.is_vip {
                    "ahora es VIP"
                } else {
                    "ya no es VIP"
                }
                .to_string(),
            ),
        );
        Some(DomainEvent::new(
            EventKind::CustomerVipChanged,
            payload,
            RelatedEntityIds::customer(self.id),
        ))
    }

    // Contact-detail edits do not notify.
    fn changed_fields(&self, _previous: &Self) -> Map<String, Value> {
        Map::new()
    }

    fn modified_event(&self, _changes: Map<String, Value>) -> Option<DomainEvent> {
        None
    }
}

/// Render-time payload for a dining table.
pub fn table_payload(table: &DiningTable) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("table_name".into(), Value::String(table.name.clone()));
    payload.insert("zone".into(), Value::String(table.zone.clone()));
    payload.insert("capacity".into(), json!(table.capacity));
    payload
}

/// Status-to-event lookup for tables. `reservada` and `bloqueada` have no
/// entry and are silently ignored.
fn table_transition_kind(state: TableState) -> Option<EventKind> {
    match state {
        TableState::Ocupada => Some(EventKind::TableOccupied),
        TableState::Libre => Some(EventKind::TableFreed),
        TableState::Reservada | TableState::Bloqueada => None,
    }
}

impl Snapshotted for DiningTable {
    type Id = mesahub_core::types::id::TableId;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Floor-plan additions are admin operations, not notifications.
    fn created_event(&self) -> Option<DomainEvent> {
        None
    }

    fn status_changed(&self, previous: &Self) -> bool {
        self.state != previous.state
    }

    fn transition_event(&self, _previous: &Self) -> Option<DomainEvent> {
        table_transition_kind(self.state).map(|kind| {
            DomainEvent::new(kind, table_payload(self), RelatedEntityIds::table(self.id))
        })
    }

    fn changed_fields(&self, _previous: &Self) -> Map<String, Value> {
        Map::new()
    }

    fn modified_event(&self, _changes: Map<String, Value>) -> Option<DomainEvent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use mesahub_core::types::id::ReservationId;

    use super::super::diff;
    use super::*;

    fn reservation(id: ReservationId, status: ReservationStatus, notes: &str) -> Reservation {
        Reservation {
            id,
            customer_id: None,
            customer_name: "García".to_string(),
            table_id: None,
            party_size: 2,
            starts_at: Utc::now(),
            status,
            notes: Some(notes.to_string()),
            updated_at: Utc::now(),
        }
    }

    fn keyed(reservations: Vec<Reservation>) -> HashMap<ReservationId, Reservation> {
        reservations.into_iter().map(|r| (r.id, r)).collect()
    }

    #[test]
    fn new_id_yields_exactly_one_created_event() {
        let id = ReservationId::new();
        let previous = HashMap::new();
        let current = keyed(vec![reservation(id, ReservationStatus::Pendiente, "x")]);

        let events = diff(&previous, &current);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ReservationCreated);
        assert_eq!(events[0].related.reservation_id, Some(id));
    }

    #[test]
    fn status_transition_suppresses_field_change_event() {
        let id = ReservationId::new();
        let previous = keyed(vec![reservation(
            id,
            ReservationStatus::Pendiente,
            "x",
        )]);
        let current = keyed(vec![reservation(
            id,
            ReservationStatus::Confirmada,
            "y",
        )]);

        let events = diff(&previous, &current);
        assert_eq!(events.len(), 1, "notes change must not add a second event");
        assert_eq!(events[0].kind, EventKind::ReservationConfirmed);
    }

    #[test]
    fn field_changes_batch_into_one_modified_event() {
        let id = ReservationId::new();
        let mut before = reservation(id, ReservationStatus::Confirmada, "x");
        before.party_size = 2;
        let mut after = reservation(id, ReservationStatus::Confirmada, "y");
        after.party_size = 4;
        after.starts_at = before.starts_at;

        let events = diff(&keyed(vec![before]), &keyed(vec![after]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ReservationModified);

        let changes = events[0].payload["changes"].as_object().unwrap();
        assert!(changes.contains_key("notes"));
        assert!(changes.contains_key("party_size"));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn unmapped_target_status_emits_nothing() {
        let id = ReservationId::new();
        let previous = keyed(vec![reservation(id, ReservationStatus::Pendiente, "x")]);
        let current = keyed(vec![reservation(
            id,
            ReservationStatus::PendienteConfirmacion,
            "x",
        )]);

        assert!(diff(&previous, &current).is_empty());
    }

    #[test]
    fn deletion_emits_nothing() {
        let id = ReservationId::new();
        let previous = keyed(vec![reservation(id, ReservationStatus::Confirmada, "x")]);
        let current = HashMap::new();

        assert!(diff(&previous, &current).is_empty());
    }

    #[test]
    fn identical_snapshots_emit_nothing() {
        let id = ReservationId::new();
        let snapshot = keyed(vec![reservation(id, ReservationStatus::Confirmada, "x")]);
        assert!(diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn vip_flag_change_is_a_customer_transition() {
        let id = mesahub_core::types::id::CustomerId::new();
        let base = Customer {
            id,
            full_name: "Marta López".to_string(),
            phone: None,
            email: None,
            is_vip: false,
            visit_count: 12,
            updated_at: Utc::now(),
        };
        let mut vip = base.clone();
        vip.is_vip = true;

        let previous: HashMap<_, _> = [(id, base)].into();
        let current: HashMap<_, _> = [(id, vip)].into();

        let events = diff(&previous, &current);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CustomerVipChanged);
    }

    #[test]
    fn table_block_transition_is_ignored() {
        let id = mesahub_core::types::id::TableId::new();
        let base = DiningTable {
            id,
            name: "Mesa 4".to_string(),
            zone: "terraza".to_string(),
            capacity: 4,
            state: TableState::Libre,
            occupied_since: None,
            updated_at: Utc::now(),
        };
        let mut blocked = base.clone();
        blocked.state = TableState::Bloqueada;

        let previous: HashMap<_, _> = [(id, base)].into();
        let current: HashMap<_, _> = [(id, blocked)].into();

        assert!(diff(&previous, &current).is_empty());
    }
}
