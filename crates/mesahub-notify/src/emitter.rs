//! Emission façade.
//!
//! The single funnel through which domain events become durable
//! notifications. Resolves the type catalog, renders templates, applies
//! per-event overrides over registry defaults, and hands the finished
//! draft to the store. Producers never talk to the store directly.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use mesahub_core::error::AppError;
use mesahub_core::events::{DomainEvent, EventKind};
use mesahub_entity::notification::{Notification, NotificationDraft};
use mesahub_store::NotificationStore;

use crate::taxonomy::{self, TypeCatalog};

/// Why a single event failed to become a notification.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The catalog has no active entry for the event's type code.
    #[error("no active catalog entry for event kind {0}")]
    UnmappedKind(EventKind),

    /// A template variable was missing from the event payload.
    #[error("event kind {kind} payload missing template variable '{variable}'")]
    InvalidPayload {
        kind: EventKind,
        variable: String,
    },

    /// The store rejected the draft.
    #[error(transparent)]
    Store(#[from] AppError),
}

/// Turns domain events into stored notifications.
pub struct Emitter {
    store: Arc<dyn NotificationStore>,
    catalog: Arc<TypeCatalog>,
}

impl Emitter {
    pub fn new(store: Arc<dyn NotificationStore>, catalog: Arc<TypeCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Emit one event.
    ///
    /// Event-level overrides (priority, actions, expiry) win over the
    /// registry defaults; the registry always supplies the templates and
    /// type code. Deduplication happens inside the store.
    pub async fn emit(&self, event: DomainEvent) -> Result<Notification, EmitError> {
        let definition = self
            .catalog
            .resolve(event.kind)
            .ok_or(EmitError::UnmappedKind(event.kind))?;
        let spec = taxonomy::event_spec(event.kind);

        let title = taxonomy::render(spec.title, &event.payload).map_err(|e| {
            EmitError::InvalidPayload {
                kind: event.kind,
                variable: e.variable,
            }
        })?;
        let message = taxonomy::render(spec.message, &event.payload).map_err(|e| {
            EmitError::InvalidPayload {
                kind: event.kind,
                variable: e.variable,
            }
        })?;

        let draft = NotificationDraft {
            type_code: definition.code.clone(),
            title,
            message,
            priority: event.priority.unwrap_or(spec.priority),
            data: event.payload,
            actions: event
                .actions
                .unwrap_or_else(|| spec.actions.iter().map(|a| a.to_string()).collect()),
            related: event.related,
            expires_after: event.expires_after.or_else(|| spec.expires_after()),
        };

        Ok(self.store.create(draft).await?)
    }

    /// Emit a batch, isolating failures.
    ///
    /// One bad event never blocks its siblings; failures are logged and
    /// dropped. Returns the number of notifications actually stored.
    pub async fn emit_all(&self, events: Vec<DomainEvent>) -> usize {
        let mut stored = 0;
        for event in events {
            let kind = event.kind;
            match self.emit(event).await {
                Ok(_) => stored += 1,
                Err(error) => {
                    warn!(%kind, %error, "dropping event that failed to emit");
                }
            }
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use mesahub_core::events::{Priority, RelatedEntityIds};
    use mesahub_core::types::id::ReservationId;
    use mesahub_store::MemoryStore;

    use super::*;

    fn emitter_with_store() -> (Emitter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let emitter = Emitter::new(store.clone(), Arc::new(TypeCatalog::builtin()));
        (emitter, store)
    }

    fn confirmed_event() -> DomainEvent {
        let mut payload = Map::new();
        payload.insert("customer_name".into(), "García".into());
        payload.insert("party_size".into(), 4.into());
        DomainEvent::new(
            EventKind::ReservationConfirmed,
            payload,
            RelatedEntityIds::reservation(ReservationId::new()),
        )
    }

    #[tokio::test]
    async fn registry_defaults_fill_the_draft() {
        let (emitter, _) = emitter_with_store();

        let stored = emitter.emit(confirmed_event()).await.unwrap();
        assert_eq!(stored.type_code, "reservation_confirmed");
        assert_eq!(stored.title, "Reserva confirmada");
        assert_eq!(stored.message, "García confirmó su reserva de 4 pax");
        assert_eq!(stored.priority, Priority::Normal);
        assert_eq!(stored.actions, vec!["ver_reserva".to_string()]);
    }

    #[tokio::test]
    async fn event_overrides_beat_registry_defaults() {
        let (emitter, _) = emitter_with_store();

        let event = confirmed_event().with_priority(Priority::High);
        let stored = emitter.emit(event).await.unwrap();
        assert_eq!(stored.priority, Priority::High);
    }

    #[tokio::test]
    async fn missing_template_variable_fails_the_event() {
        let (emitter, store) = emitter_with_store();

        let event = DomainEvent::new(
            EventKind::ReservationConfirmed,
            Map::new(),
            RelatedEntityIds::reservation(ReservationId::new()),
        );
        let error = emitter.emit(event).await.unwrap_err();
        assert!(matches!(error, EmitError::InvalidPayload { .. }));
        assert_eq!(store.notification_count(), 0);
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let (emitter, store) = emitter_with_store();

        let bad = DomainEvent::new(
            EventKind::ReservationConfirmed,
            Map::new(),
            RelatedEntityIds::reservation(ReservationId::new()),
        );
        let stored = emitter.emit_all(vec![bad, confirmed_event()]).await;
        assert_eq!(stored, 1);
        assert_eq!(store.notification_count(), 1);
    }
}
