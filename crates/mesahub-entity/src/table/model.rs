//! Dining table entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use mesahub_core::types::id::TableId;

use super::state::TableState;

/// A floor-plan table as held in the tracked snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    /// Unique table identifier.
    pub id: TableId,
    /// Display name ("Mesa 4").
    pub name: String,
    /// Floor-plan zone ("terraza", "salón").
    pub zone: String,
    /// Seat capacity.
    pub capacity: i32,
    /// Current occupancy state.
    pub state: TableState,
    /// When the current party was seated, if occupied.
    pub occupied_since: Option<DateTime<Utc>>,
    /// Last modification time in the store.
    pub updated_at: DateTime<Utc>,
}

impl DiningTable {
    /// Whether the table has been occupied longer than `allotted`.
    pub fn overstayed(&self, allotted: Duration, now: DateTime<Utc>) -> bool {
        self.state == TableState::Ocupada
            && self
                .occupied_since
                .map(|since| now - since > allotted)
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesahub_core::types::id::TableId;

    fn table(state: TableState, occupied_minutes_ago: Option<i64>) -> DiningTable {
        let now = Utc::now();
        DiningTable {
            id: TableId::new(),
            name: "Mesa 1".to_string(),
            zone: "salón".to_string(),
            capacity: 4,
            state,
            occupied_since: occupied_minutes_ago.map(|m| now - Duration::minutes(m)),
            updated_at: now,
        }
    }

    #[test]
    fn occupied_past_allotment_is_overstayed() {
        let t = table(TableState::Ocupada, Some(150));
        assert!(t.overstayed(Duration::minutes(120), Utc::now()));
    }

    #[test]
    fn free_table_is_never_overstayed() {
        let t = table(TableState::Libre, Some(300));
        assert!(!t.overstayed(Duration::minutes(120), Utc::now()));
    }

    #[test]
    fn occupied_within_allotment_is_not_overstayed() {
        let t = table(TableState::Ocupada, Some(30));
        assert!(!t.overstayed(Duration::minutes(120), Utc::now()));
    }
}
