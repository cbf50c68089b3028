//! TableTracker - occupancy derived from active orders
//!
//! Every operation takes a `&mut SqliteConnection`, so the same code runs on
//! a pooled connection or inside the order lifecycle transaction
//! (`&mut *tx`).
//!
//! ```text
//! create_order ──► mark_occupied   (disponible → ocupada, else no-op)
//! entregada / cancelada ──► release (→ disponible iff no pendiente/en_proceso left)
//! ```

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{DiningTable, Order, TableOverview, TableStatus};
use sqlx::SqliteConnection;

use crate::db::repository::{RepoResult, dining_table, order};

/// Stateless facade over the table/order queries
pub struct TableTracker;

impl TableTracker {
    /// Flip `disponible → ocupada`
    ///
    /// Returns `false` without touching the row when the table is in any other
    /// state (or does not exist).
    pub async fn mark_occupied(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<bool> {
        let occupied = dining_table::occupy_if_available(&mut *conn, table_id).await?;
        tracing::debug!(table_id, occupied, "mark_occupied");
        Ok(occupied)
    }

    /// Free the table when no order on it is still `pendiente` / `en_proceso`
    ///
    /// Returns `false` (and leaves the row alone) while another order holds it.
    pub async fn release(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<bool> {
        let holding = order::count_occupying_on_table(&mut *conn, table_id).await?;
        if holding > 0 {
            tracing::debug!(table_id, holding, "Table still held by active orders");
            return Ok(false);
        }
        let released = dining_table::set_status(&mut *conn, table_id, TableStatus::Available).await?;
        if released {
            tracing::info!(table_id, "Table released");
        }
        Ok(released)
    }

    /// Most recent `pendiente` / `en_proceso` order on the table
    pub async fn active_order(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<Option<Order>> {
        order::find_occupying_on_table(&mut *conn, table_id).await
    }

    /// Whether a new order may be placed on the table
    ///
    /// An `ocupada` flag with no active order behind it counts as free.
    pub async fn can_accept_orders(
        conn: &mut SqliteConnection,
        table: &DiningTable,
    ) -> RepoResult<bool> {
        let active = if table.is_active && table.status == TableStatus::Occupied {
            Self::active_order(conn, table.id).await?
        } else {
            None
        };
        Ok(accepts_orders(table, active.as_ref()))
    }

    /// Manual status change from the floor plan
    ///
    /// Setting `disponible` is refused while an active order holds the table.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        table_id: i64,
        status: TableStatus,
    ) -> AppResult<DiningTable> {
        let table = dining_table::find_by_id(&mut *conn, table_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::TableNotFound).with_detail("table_id", table_id))?;

        if status == TableStatus::Available
            && let Some(active) = Self::active_order(conn, table_id).await?
        {
            return Err(AppError::with_message(
                ErrorCode::TableHasActiveOrders,
                format!("Table {} still has active order {}", table.number, active.order_number),
            )
            .with_detail("order_id", active.id));
        }

        dining_table::set_status(&mut *conn, table_id, status).await?;
        tracing::info!(table_id, from = %table.status, to = %status, "Table status set manually");

        dining_table::find_by_id(&mut *conn, table_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::TableNotFound))
    }

    /// Table with its derived order information
    pub async fn overview(conn: &mut SqliteConnection, table: DiningTable) -> RepoResult<TableOverview> {
        let active = Self::active_order(conn, table.id).await?;
        let can_accept_orders = accepts_orders(&table, active.as_ref());
        Ok(TableOverview {
            active_order_id: active.map(|o| o.id),
            can_accept_orders,
            table,
        })
    }
}

/// `active` is the table's current `pendiente` / `en_proceso` order
fn accepts_orders(table: &DiningTable, active: Option<&Order>) -> bool {
    if !table.is_active {
        return false;
    }
    match table.status {
        TableStatus::Available => true,
        TableStatus::Reserved => false,
        TableStatus::Occupied => active.is_none(),
    }
}
