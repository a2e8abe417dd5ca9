//! `EntityGateway` implementation over PostgreSQL.
//!
//! The windowed queries flag rows server-side (`upcoming_notified_at`,
//! `overstay_notified_at`) so a restarted process never re-reports an
//! entity already inside the window.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast;

use mesahub_core::result::AppResult;
use mesahub_core::types::id::{CustomerId, ReservationId, TableId};
use mesahub_entity::customer::Customer;
use mesahub_entity::reservation::Reservation;
use mesahub_entity::table::DiningTable;

use crate::traits::{EntityCollection, EntityGateway};

use super::PgStore;
use super::rows::{customer_from_row, db_err, reservation_from_row, table_from_row};

#[async_trait]
impl EntityGateway for PgStore {
    async fn reservations(&self) -> AppResult<HashMap<ReservationId, Reservation>> {
        let rows = sqlx::query("SELECT * FROM reservations")
            .fetch_all(self.pool())
            .await
            .map_err(|e| db_err("Failed to fetch reservations", e))?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in &rows {
            if let Some(reservation) = reservation_from_row(row)? {
                map.insert(reservation.id, reservation);
            }
        }
        Ok(map)
    }

    async fn customers(&self) -> AppResult<HashMap<CustomerId, Customer>> {
        let rows = sqlx::query("SELECT * FROM customers")
            .fetch_all(self.pool())
            .await
            .map_err(|e| db_err("Failed to fetch customers", e))?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in &rows {
            let customer = customer_from_row(row)?;
            map.insert(customer.id, customer);
        }
        Ok(map)
    }

    async fn tables(&self) -> AppResult<HashMap<TableId, DiningTable>> {
        let rows = sqlx::query("SELECT * FROM dining_tables")
            .fetch_all(self.pool())
            .await
            .map_err(|e| db_err("Failed to fetch tables", e))?;

        let mut map = HashMap::with_capacity(rows.len());
        for row in &rows {
            if let Some(table) = table_from_row(row)? {
                map.insert(table.id, table);
            }
        }
        Ok(map)
    }

    async fn upcoming_reservations(
        &self,
        window_minutes: i64,
        max_results: i64,
    ) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query(
            "UPDATE reservations SET upcoming_notified_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM reservations \
                 WHERE status = 'confirmada' \
                   AND upcoming_notified_at IS NULL \
                   AND starts_at > NOW() \
                   AND starts_at <= NOW() + make_interval(mins => $1) \
                 ORDER BY starts_at LIMIT $2 \
             ) \
             RETURNING *",
        )
        .bind(window_minutes as i32)
        .bind(max_results)
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_err("Failed to query upcoming reservations", e))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(reservation) = reservation_from_row(row)? {
                hits.push(reservation);
            }
        }
        Ok(hits)
    }

    async fn overstayed_tables(
        &self,
        allotted_minutes: i64,
        max_results: i64,
    ) -> AppResult<Vec<DiningTable>> {
        let rows = sqlx::query(
            "UPDATE dining_tables SET overstay_notified_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM dining_tables \
                 WHERE state = 'ocupada' \
                   AND overstay_notified_at IS NULL \
                   AND occupied_since IS NOT NULL \
                   AND occupied_since < NOW() - make_interval(mins => $1) \
                 ORDER BY occupied_since LIMIT $2 \
             ) \
             RETURNING *",
        )
        .bind(allotted_minutes as i32)
        .bind(max_results)
        .fetch_all(self.pool())
        .await
        .map_err(|e| db_err("Failed to query overstayed tables", e))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(table) = table_from_row(row)? {
                hits.push(table);
            }
        }
        Ok(hits)
    }

    fn subscribe_entities(&self) -> broadcast::Receiver<EntityCollection> {
        self.entity_tx.subscribe()
    }
}
