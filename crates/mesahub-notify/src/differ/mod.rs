//! Snapshot differ.
//!
//! Compares successive keyed snapshots of a tracked collection and derives
//! domain events for creations, status transitions, and batched field
//! changes. Rule order is authoritative: a newly created entity never also
//! yields a modified event, and a status change suppresses field-change
//! detection for that entity in the same pass. Deletions produce nothing.

pub mod tracked;

use std::collections::HashMap;
use std::hash::Hash;

use mesahub_core::events::DomainEvent;

/// A keyed, point-in-time copy of one tracked collection.
///
/// Replaced wholesale on each refresh; never mutated in place, so a
/// concurrent reader cannot observe a half-updated snapshot.
pub type Snapshot<K, V> = HashMap<K, V>;

/// Behavior the differ needs from a tracked entity type.
pub trait Snapshotted {
    /// Snapshot key type.
    type Id: Eq + Hash + Copy;

    /// The entity's snapshot key.
    fn id(&self) -> Self::Id;

    /// Event for an id absent from the previous snapshot, if this entity
    /// type announces creations.
    fn created_event(&self) -> Option<DomainEvent>;

    /// Whether the designated status field changed against `previous`.
    fn status_changed(&self, previous: &Self) -> bool;

    /// Event for a status change. `None` means the target status has no
    /// mapped event and the transition is silently ignored by design.
    fn transition_event(&self, previous: &Self) -> Option<DomainEvent>;

    /// `{field: {old, new}}` for every interesting non-status field that
    /// differs from `previous`.
    fn changed_fields(&self, previous: &Self) -> serde_json::Map<String, serde_json::Value>;

    /// Single batched event carrying all field changes from one pass, if
    /// this entity type announces modifications.
    fn modified_event(
        &self,
        changes: serde_json::Map<String, serde_json::Value>,
    ) -> Option<DomainEvent>;
}

/// Diff two snapshots of one collection into domain events.
///
/// O(|previous| + |current|): one pass over `current` with keyed lookups
/// into `previous`.
pub fn diff<T: Snapshotted>(
    previous: &Snapshot<T::Id, T>,
    current: &Snapshot<T::Id, T>,
) -> Vec<DomainEvent> {
    let mut events = Vec::new();

    for (id, entity) in current {
        match previous.get(id) {
            None => {
                if let Some(event) = entity.created_event() {
                    events.push(event);
                }
            }
            Some(prev) => {
                if entity.status_changed(prev) {
                    if let Some(event) = entity.transition_event(prev) {
                        events.push(event);
                    }
                } else {
                    let changes = entity.changed_fields(prev);
                    if !changes.is_empty() {
                        if let Some(event) = entity.modified_event(changes) {
                            events.push(event);
                        }
                    }
                }
            }
        }
    }

    // Ids present only in `previous` (deletions) produce no event.
    events
}
