//! Event taxonomy registry.
//!
//! Maps every [`EventKind`] to its persisted type code, message templates,
//! default priority, default actions, and optional expiry. The mapping is
//! an exhaustive `match` with no wildcard arm: adding an event kind
//! without a registry entry is a compile error, never a runtime fallback.

use std::collections::HashMap;

use serde_json::{Map, Value};

use mesahub_core::events::{EventKind, Priority};
use mesahub_entity::notification::NotificationTypeDefinition;

/// Static registry entry for one event kind.
#[derive(Debug, Clone, Copy)]
pub struct EventSpec {
    /// Persisted notification type code.
    pub code: &'static str,
    /// Title template (`{var}` interpolation only).
    pub title: &'static str,
    /// Message template (`{var}` interpolation only).
    pub message: &'static str,
    /// Default priority.
    pub priority: Priority,
    /// Default suggested actions, in order.
    pub actions: &'static [&'static str],
    /// Default expiry in minutes, if the notification goes stale.
    pub expires_after_minutes: Option<i64>,
}

impl EventSpec {
    /// Default expiry as a duration.
    pub fn expires_after(&self) -> Option<chrono::Duration> {
        self.expires_after_minutes.map(chrono::Duration::minutes)
    }
}

/// The registry proper: one entry per member of the closed event set.
pub fn event_spec(kind: EventKind) -> EventSpec {
    match kind {
        EventKind::ReservationCreated => EventSpec {
            code: "reservation_created",
            title: "Nueva reserva",
            message: "{customer_name} · {party_size} pax · {starts_at}",
            priority: Priority::Normal,
            actions: &["ver_reserva", "confirmar"],
            expires_after_minutes: None,
        },
        EventKind::ReservationConfirmed => EventSpec {
            code: "reservation_confirmed",
            title: "Reserva confirmada",
            message: "{customer_name} confirmó su reserva de {party_size} pax",
            priority: Priority::Normal,
            actions: &["ver_reserva"],
            expires_after_minutes: None,
        },
        EventKind::ReservationSeated => EventSpec {
            code: "reservation_seated",
            title: "Mesa sentada",
            message: "{customer_name} ya está en mesa",
            priority: Priority::Low,
            actions: &["ver_reserva"],
            expires_after_minutes: None,
        },
        EventKind::ReservationCompleted => EventSpec {
            code: "reservation_completed",
            title: "Visita completada",
            message: "La visita de {customer_name} terminó",
            priority: Priority::Low,
            actions: &["ver_reserva"],
            expires_after_minutes: None,
        },
        EventKind::ReservationCancelled => EventSpec {
            code: "reservation_cancelled",
            title: "Reserva cancelada",
            message: "{customer_name} canceló su reserva de {party_size} pax",
            priority: Priority::High,
            actions: &["ver_reserva", "contactar_cliente"],
            expires_after_minutes: None,
        },
        EventKind::ReservationNoShow => EventSpec {
            code: "reservation_no_show",
            title: "No-show",
            message: "{customer_name} no se presentó",
            priority: Priority::High,
            actions: &["ver_reserva", "contactar_cliente"],
            expires_after_minutes: None,
        },
        EventKind::ReservationModified => EventSpec {
            code: "reservation_modified",
            title: "Reserva modificada",
            message: "Cambios en la reserva de {customer_name}",
            priority: Priority::Normal,
            actions: &["ver_reserva"],
            expires_after_minutes: None,
        },
        EventKind::ReservationUpcoming => EventSpec {
            code: "reservation_upcoming",
            title: "Reserva próxima",
            message: "{customer_name} llega en {minutes_until} min · {party_size} pax",
            priority: Priority::High,
            actions: &["ver_reserva", "marcar_sentada"],
            expires_after_minutes: Some(120),
        },
        EventKind::TableOccupied => EventSpec {
            code: "table_occupied",
            title: "Mesa ocupada",
            message: "{table_name} ocupada",
            priority: Priority::Low,
            actions: &["ver_mesa"],
            expires_after_minutes: None,
        },
        EventKind::TableFreed => EventSpec {
            code: "table_freed",
            title: "Mesa liberada",
            message: "{table_name} quedó libre",
            priority: Priority::Low,
            actions: &["ver_mesa"],
            expires_after_minutes: None,
        },
        EventKind::TableOverstay => EventSpec {
            code: "table_overstay",
            title: "Mesa excedida",
            message: "{table_name} lleva {occupied_minutes} min ocupada",
            priority: Priority::High,
            actions: &["ver_mesa", "liberar_mesa"],
            expires_after_minutes: Some(60),
        },
        EventKind::CustomerCreated => EventSpec {
            code: "customer_created",
            title: "Nuevo cliente",
            message: "{full_name} se añadió al CRM",
            priority: Priority::Low,
            actions: &["ver_cliente"],
            expires_after_minutes: None,
        },
        EventKind::CustomerVipChanged => EventSpec {
            code: "customer_vip_changed",
            title: "Cambio VIP",
            message: "{full_name} {vip_status}",
            priority: Priority::Normal,
            actions: &["ver_cliente"],
            expires_after_minutes: None,
        },
    }
}

/// A template variable missing from the event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    /// Name of the missing variable.
    pub variable: String,
}

/// Interpolate `{var}` placeholders from the payload. No executable
/// templates; a missing or null variable fails the render.
pub fn render(template: &str, payload: &Map<String, Value>) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let name = &after[..close];
        match payload.get(name) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Number(n)) => out.push_str(&n.to_string()),
            Some(Value::Bool(b)) => out.push_str(if *b { "sí" } else { "no" }),
            Some(_) | None => {
                return Err(RenderError {
                    variable: name.to_string(),
                });
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// The seeded notification type catalog, cached for the process lifetime.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    entries: HashMap<String, NotificationTypeDefinition>,
}

impl TypeCatalog {
    /// Build a catalog from remote definitions.
    pub fn from_definitions(definitions: Vec<NotificationTypeDefinition>) -> Self {
        Self {
            entries: definitions.into_iter().map(|d| (d.code.clone(), d)).collect(),
        }
    }

    /// The built-in catalog matching the migration seed, used when the
    /// remote table has not been populated yet.
    pub fn builtin() -> Self {
        let definitions = EventKind::ALL
            .iter()
            .map(|&kind| {
                let spec = event_spec(kind);
                NotificationTypeDefinition::new(spec.code, spec.title, "", "")
            })
            .collect();
        Self::from_definitions(definitions)
    }

    /// Resolve an event kind to its catalog entry.
    ///
    /// Returns `None` when the catalog lacks the code or the entry is
    /// inactive; callers drop the event with a warning, never promote it
    /// to a default type.
    pub fn resolve(&self, kind: EventKind) -> Option<&NotificationTypeDefinition> {
        self.entries
            .get(event_spec(kind).code)
            .filter(|d| d.active)
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_event_kind_resolves_in_the_builtin_catalog() {
        let catalog = TypeCatalog::builtin();
        for &kind in EventKind::ALL {
            let def = catalog.resolve(kind);
            assert!(def.is_some(), "no catalog entry for {kind}");
            assert_eq!(def.unwrap().code, event_spec(kind).code);
        }
    }

    #[test]
    fn inactive_entries_do_not_resolve() {
        let mut definitions: Vec<_> = EventKind::ALL
            .iter()
            .map(|&k| NotificationTypeDefinition::new(event_spec(k).code, "", "", ""))
            .collect();
        definitions[0].active = false;
        let disabled = definitions[0].code.clone();
        let catalog = TypeCatalog::from_definitions(definitions);

        let kind = EventKind::ALL
            .iter()
            .copied()
            .find(|&k| event_spec(k).code == disabled)
            .unwrap();
        assert!(catalog.resolve(kind).is_none());
    }

    #[test]
    fn render_interpolates_strings_and_numbers() {
        let payload = json!({"customer_name": "García", "party_size": 4})
            .as_object()
            .unwrap()
            .clone();
        let rendered = render("{customer_name} · {party_size} pax", &payload).unwrap();
        assert_eq!(rendered, "García · 4 pax");
    }

    #[test]
    fn render_fails_on_missing_variable() {
        let payload = Map::new();
        let err = render("{customer_name} llega", &payload).unwrap_err();
        assert_eq!(err.variable, "customer_name");
    }

    #[test]
    fn render_leaves_templates_without_placeholders_alone() {
        let payload = Map::new();
        assert_eq!(render("No-show", &payload).unwrap(), "No-show");
    }
}
