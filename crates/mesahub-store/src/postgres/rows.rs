//! Manual row-to-model mapping.
//!
//! Status and priority columns are plain TEXT; mapping by hand keeps the
//! typed enums in the entity crate without tying them to a database enum
//! type.

use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use mesahub_core::error::{AppError, ErrorKind};
use mesahub_core::events::{Priority, RelatedEntityIds};
use mesahub_core::result::AppResult;
use mesahub_entity::customer::Customer;
use mesahub_entity::notification::{Notification, NotificationTypeDefinition};
use mesahub_entity::reservation::{Reservation, ReservationStatus};
use mesahub_entity::table::{DiningTable, TableState};

pub(super) fn db_err(context: &str, e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{context}: {e}"), e)
}

fn column(context: &'static str, e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("Bad column {context}: {e}"), e)
}

pub(super) fn notification_from_row(row: &PgRow) -> AppResult<Notification> {
    let data: serde_json::Value = row.try_get("data").map_err(|e| column("data", e))?;
    let data = match data {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    let actions: serde_json::Value = row.try_get("actions").map_err(|e| column("actions", e))?;
    let actions: Vec<String> = serde_json::from_value(actions).unwrap_or_default();

    let priority: String = row.try_get("priority").map_err(|e| column("priority", e))?;

    Ok(Notification {
        id: row.try_get("id").map_err(|e| column("id", e))?,
        type_code: row
            .try_get("type_code")
            .map_err(|e| column("type_code", e))?,
        title: row.try_get("title").map_err(|e| column("title", e))?,
        message: row.try_get("message").map_err(|e| column("message", e))?,
        priority: Priority::from_str_value(&priority),
        created_at: row
            .try_get("created_at")
            .map_err(|e| column("created_at", e))?,
        is_read: row.try_get("is_read").map_err(|e| column("is_read", e))?,
        read_at: row.try_get("read_at").map_err(|e| column("read_at", e))?,
        expires_at: row
            .try_get("expires_at")
            .map_err(|e| column("expires_at", e))?,
        data,
        actions,
        related: RelatedEntityIds {
            reservation_id: row
                .try_get::<Option<Uuid>, _>("reservation_id")
                .map_err(|e| column("reservation_id", e))?
                .map(Into::into),
            customer_id: row
                .try_get::<Option<Uuid>, _>("customer_id")
                .map_err(|e| column("customer_id", e))?
                .map(Into::into),
            table_id: row
                .try_get::<Option<Uuid>, _>("table_id")
                .map_err(|e| column("table_id", e))?
                .map(Into::into),
            staff_id: row
                .try_get::<Option<Uuid>, _>("staff_id")
                .map_err(|e| column("staff_id", e))?
                .map(Into::into),
        },
    })
}

/// Map a reservation row; `None` when the stored status is unknown.
pub(super) fn reservation_from_row(row: &PgRow) -> AppResult<Option<Reservation>> {
    let status: String = row.try_get("status").map_err(|e| column("status", e))?;
    let Some(status) = ReservationStatus::from_str_value(&status) else {
        tracing::warn!(%status, "Skipping reservation with unknown status");
        return Ok(None);
    };

    Ok(Some(Reservation {
        id: row.try_get("id").map_err(|e| column("id", e))?,
        customer_id: row
            .try_get::<Option<Uuid>, _>("customer_id")
            .map_err(|e| column("customer_id", e))?
            .map(Into::into),
        customer_name: row
            .try_get("customer_name")
            .map_err(|e| column("customer_name", e))?,
        table_id: row
            .try_get::<Option<Uuid>, _>("table_id")
            .map_err(|e| column("table_id", e))?
            .map(Into::into),
        party_size: row
            .try_get("party_size")
            .map_err(|e| column("party_size", e))?,
        starts_at: row
            .try_get("starts_at")
            .map_err(|e| column("starts_at", e))?,
        status,
        notes: row.try_get("notes").map_err(|e| column("notes", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| column("updated_at", e))?,
    }))
}

pub(super) fn customer_from_row(row: &PgRow) -> AppResult<Customer> {
    Ok(Customer {
        id: row.try_get("id").map_err(|e| column("id", e))?,
        full_name: row
            .try_get("full_name")
            .map_err(|e| column("full_name", e))?,
        phone: row.try_get("phone").map_err(|e| column("phone", e))?,
        email: row.try_get("email").map_err(|e| column("email", e))?,
        is_vip: row.try_get("is_vip").map_err(|e| column("is_vip", e))?,
        visit_count: row
            .try_get("visit_count")
            .map_err(|e| column("visit_count", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| column("updated_at", e))?,
    })
}

/// Map a table row; `None` when the stored state is unknown.
pub(super) fn table_from_row(row: &PgRow) -> AppResult<Option<DiningTable>> {
    let state: String = row.try_get("state").map_err(|e| column("state", e))?;
    let Some(state) = TableState::from_str_value(&state) else {
        tracing::warn!(%state, "Skipping table with unknown state");
        return Ok(None);
    };

    Ok(Some(DiningTable {
        id: row.try_get("id").map_err(|e| column("id", e))?,
        name: row.try_get("name").map_err(|e| column("name", e))?,
        zone: row.try_get("zone").map_err(|e| column("zone", e))?,
        capacity: row.try_get("capacity").map_err(|e| column("capacity", e))?,
        state,
        occupied_since: row
            .try_get("occupied_since")
            .map_err(|e| column("occupied_since", e))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| column("updated_at", e))?,
    }))
}

pub(super) fn type_definition_from_row(row: &PgRow) -> AppResult<NotificationTypeDefinition> {
    Ok(NotificationTypeDefinition {
        code: row.try_get("code").map_err(|e| column("code", e))?,
        display_name: row
            .try_get("display_name")
            .map_err(|e| column("display_name", e))?,
        icon: row.try_get("icon").map_err(|e| column("icon", e))?,
        color: row.try_get("color").map_err(|e| column("color", e))?,
        active: row.try_get("active").map_err(|e| column("active", e))?,
    })
}
