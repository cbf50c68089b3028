//! OrderLifecycle - order state machine, table coupling and fan-out
//!
//! # Status change flow
//!
//! ```text
//! update_status(order, next, expected_version, actor)
//!     ├─ BEGIN IMMEDIATE
//!     ├─ 1. load order (OrderNotFound)
//!     ├─ 2. validate transition (OrderInvalidTransition)
//!     ├─ 3. CAS status on version (OrderVersionConflict)
//!     ├─ 4. append history (status_changed)
//!     ├─ 5. entregada / cancelada + table → TableTracker::release
//!     ├─ 6. build snapshot
//!     ├─ COMMIT
//!     └─ 7. OrderNotifier::order_updated(snapshot)
//! ```
//!
//! Nothing is published when any step fails; the transaction rolls back on
//! drop. A crash between commit and publish loses the notification, which
//! dashboards recover from by polling.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    CashMovementType, DEFAULT_CATEGORY_COLOR, HistoryAction, MovementType, Order, OrderCreate,
    OrderDetail, OrderFilter, OrderHistory, OrderItemInput, OrderSnapshot, OrderSnapshotItem,
    OrderStatus, PaymentMethod, Product, TableStatus,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

use crate::catalog::StockResolver;
use crate::db;
use crate::db::repository::inventory::{MovementOutcome, NewMovement};
use crate::db::repository::order::{NewOrder, NewOrderItem};
use crate::db::repository::{
    RepoError, cash_register, dining_table, inventory, order, product,
};
use crate::message::OrderNotifier;
use crate::tables::TableTracker;
use crate::utils::money;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};

/// Attempts at generating a unique order number
const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Maximum lines per order
const MAX_ORDER_ITEMS: usize = 200;

#[derive(Debug, Clone)]
pub struct OrderLifecycle {
    pool: SqlitePool,
    notifier: OrderNotifier,
}

impl OrderLifecycle {
    pub fn new(pool: SqlitePool, notifier: OrderNotifier) -> Self {
        Self { pool, notifier }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Cart submission
    ///
    /// Prices lines from the catalog, consumes tracked stock, occupies the
    /// table and publishes the new order, all after one commit.
    pub async fn create_order(&self, input: OrderCreate, actor_id: i64) -> AppResult<OrderDetail> {
        validate_order_input(&input)?;

        let mut tx = db::begin_write(&self.pool).await?;

        if let Some(table_id) = input.table_id {
            let table = dining_table::find_by_id(&mut *tx, table_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::TableNotFound).with_detail("table_id", table_id)
                })?;
            if !TableTracker::can_accept_orders(&mut tx, &table).await? {
                let code = if table.is_active && table.status == TableStatus::Occupied {
                    ErrorCode::TableOccupied
                } else {
                    ErrorCode::TableNotAvailable
                };
                return Err(AppError::new(code).with_detail("table_id", table_id));
            }
        }

        let order_number = unique_order_number(&mut tx).await?;
        let order_id = order::insert(
            &mut *tx,
            NewOrder {
                order_number: &order_number,
                table_id: input.table_id,
                user_id: actor_id,
                bartender_id: input.bartender_id,
                notes: input.notes.as_deref(),
            },
        )
        .await?;

        let products = load_products(&mut tx, &input.items).await?;
        check_complements(&mut tx, &input.items).await?;

        for item in &input.items {
            let product = &products[&item.product_id];
            let (unit_price, is_free) = price_line(&mut tx, item, product).await?;
            consume_stock(&mut tx, product, item.quantity, order_id, actor_id).await?;
            order::insert_item(
                &mut *tx,
                order_id,
                NewOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price,
                    subtotal: money::line_subtotal(unit_price, item.quantity),
                    notes: item.notes.as_deref(),
                    is_free_complement: is_free,
                    complement_of: item.complement_of,
                },
            )
            .await?;
        }

        order::insert_history(
            &mut *tx,
            order_id,
            actor_id,
            HistoryAction::Created,
            &format!("Orden {order_number} creada con {} productos", input.items.len()),
        )
        .await?;
        recompute_in(&mut tx, order_id).await?;

        if let Some(table_id) = input.table_id {
            TableTracker::mark_occupied(&mut tx, table_id).await?;
        }

        let snapshot = load_snapshot(&mut tx, order_id).await?;
        let detail = load_detail(&mut tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            order_number = %order_number,
            table_id = ?input.table_id,
            total = detail.order.total,
            "Order created"
        );
        self.notifier.order_updated(&snapshot);
        Ok(detail)
    }

    /// Move an order to `next`
    ///
    /// `expected_version` is the version the caller last saw; `None` means
    /// "whatever is current" (still guarded by the CAS against concurrent
    /// writers in between the read and the write).
    pub async fn update_status(
        &self,
        order_id: i64,
        next: OrderStatus,
        expected_version: Option<i64>,
        actor_id: i64,
    ) -> AppResult<OrderSnapshot> {
        let mut tx = db::begin_write(&self.pool).await?;

        let current = find_order(&mut tx, order_id).await?;
        let from = current.status;
        if !from.can_transition_to(next) {
            return Err(AppError::with_message(
                ErrorCode::OrderInvalidTransition,
                format!("Cannot change order status from {from} to {next}"),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", next.as_str()));
        }

        let expected = expected_version.unwrap_or(current.version);
        if expected != current.version
            || !order::update_status_cas(&mut *tx, order_id, expected, next).await?
        {
            return Err(version_conflict(order_id, expected));
        }

        order::insert_history(
            &mut *tx,
            order_id,
            actor_id,
            HistoryAction::StatusChanged,
            &format!("Estado cambiado de {from} a {next}"),
        )
        .await?;

        if next.releases_table()
            && let Some(table_id) = current.table_id
        {
            TableTracker::release(&mut tx, table_id).await?;
        }

        let snapshot = load_snapshot(&mut tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(order_id, %from, to = %next, actor_id, "Order status changed");
        self.notifier.order_updated(&snapshot);
        Ok(snapshot)
    }

    /// Checkout: flip the paid flag
    ///
    /// Status and table occupancy are untouched and nothing is published.
    /// Cash payments are recorded as an `ingreso` on the open register.
    pub async fn mark_paid(
        &self,
        order_id: i64,
        method: PaymentMethod,
        actor_id: i64,
    ) -> AppResult<Order> {
        let mut tx = db::begin_write(&self.pool).await?;

        let current = find_order(&mut tx, order_id).await?;
        if current.is_paid {
            return Err(already_paid(&current));
        }
        if current.status == OrderStatus::Cancelled {
            return Err(AppError::business_rule("Cancelled orders cannot be paid")
                .with_detail("order_id", order_id));
        }
        if !order::mark_paid(&mut *tx, order_id, method).await? {
            return Err(already_paid(&current));
        }

        order::insert_history(
            &mut *tx,
            order_id,
            actor_id,
            HistoryAction::Paid,
            &format!("Orden pagada con {}", method.as_str()),
        )
        .await?;

        if method.is_cash()
            && current.total > 0.0
            && let Some(register) = cash_register::find_open(&mut *tx).await?
        {
            cash_register::insert_movement(
                &mut *tx,
                register.id,
                CashMovementType::Ingreso,
                current.total,
                &format!("Pago orden {}", current.order_number),
                Some(order_id),
                actor_id,
            )
            .await?;
        }

        let paid = find_order(&mut tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(order_id, method = method.as_str(), total = paid.total, "Order paid");
        Ok(paid)
    }

    /// Re-sum line subtotals into the order totals
    pub async fn recompute_totals(&self, order_id: i64, actor_id: i64) -> AppResult<Order> {
        let mut tx = db::begin_write(&self.pool).await?;
        find_order(&mut tx, order_id).await?;

        let (subtotal, total) = recompute_in(&mut tx, order_id).await?;
        order::insert_history(
            &mut *tx,
            order_id,
            actor_id,
            HistoryAction::ItemsRecalculated,
            &format!("Totales recalculados: subtotal {subtotal:.2}, total {total:.2}"),
        )
        .await?;

        let updated = find_order(&mut tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        tracing::debug!(order_id, subtotal, total, "Order totals recomputed");
        Ok(updated)
    }

    /// Irreversible delete; frees the table if nothing else holds it
    pub async fn destroy(&self, order_id: i64, actor_id: i64) -> AppResult<Order> {
        let mut tx = db::begin_write(&self.pool).await?;
        let current = find_order(&mut tx, order_id).await?;

        order::delete(&mut *tx, order_id).await?;
        if let Some(table_id) = current.table_id {
            TableTracker::release(&mut tx, table_id).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        tracing::warn!(
            order_id,
            order_number = %current.order_number,
            actor_id,
            "Order destroyed"
        );
        Ok(current)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get(&self, order_id: i64) -> AppResult<OrderDetail> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        load_detail(&mut conn, order_id).await
    }

    pub async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<Order>> {
        Ok(order::find_all(&self.pool, filter).await?)
    }

    /// Snapshots of every `pendiente` / `en_proceso` / `lista` order
    pub async fn active(&self) -> AppResult<Vec<OrderSnapshot>> {
        let orders = order::find_active(&self.pool).await?;
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        let mut snapshots = Vec::with_capacity(orders.len());
        for o in orders {
            snapshots.push(load_snapshot(&mut conn, o.id).await?);
        }
        Ok(snapshots)
    }

    pub async fn history(&self, order_id: i64) -> AppResult<Vec<OrderHistory>> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        find_order(&mut conn, order_id).await?;
        drop(conn);
        Ok(order::find_history(&self.pool, order_id).await?)
    }

    pub async fn snapshot(&self, order_id: i64) -> AppResult<OrderSnapshot> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::from)?;
        load_snapshot(&mut conn, order_id).await
    }
}

// ============================================================================
// Helpers (all run on the caller's connection / transaction)
// ============================================================================

fn order_not_found(order_id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
}

fn version_conflict(order_id: i64, expected: i64) -> AppError {
    AppError::with_message(
        ErrorCode::OrderVersionConflict,
        "Order was modified by another operation, reload and retry",
    )
    .with_detail("order_id", order_id)
    .with_detail("expected_version", expected)
}

fn already_paid(order: &Order) -> AppError {
    AppError::new(ErrorCode::OrderAlreadyPaid)
        .with_detail("order_id", order.id)
        .with_detail("payment_method", order.payment_method.map(|m| m.as_str()))
}

fn validate_order_input(input: &OrderCreate) -> AppResult<()> {
    if input.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if input.items.len() > MAX_ORDER_ITEMS {
        return Err(AppError::invalid_field(
            "items",
            format!("An order may have at most {MAX_ORDER_ITEMS} lines"),
        ));
    }
    validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
    for item in &input.items {
        money::validate_quantity(item.quantity, "quantity")?;
        validate_optional_text(&item.notes, "notes", MAX_NOTE_LEN)?;
    }
    Ok(())
}

async fn find_order(conn: &mut SqliteConnection, order_id: i64) -> AppResult<Order> {
    order::find_by_id(&mut *conn, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))
}

async fn unique_order_number(conn: &mut SqliteConnection) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = shared::util::order_number(chrono::Utc::now());
        if !order::order_number_exists(&mut *conn, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::internal("Could not allocate a unique order number"))
}

/// Every requested product, active, keyed by id
async fn load_products(
    conn: &mut SqliteConnection,
    items: &[OrderItemInput],
) -> AppResult<HashMap<i64, Product>> {
    let mut products = HashMap::new();
    for item in items {
        if products.contains_key(&item.product_id) {
            continue;
        }
        let p = product::find_by_id(&mut *conn, item.product_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", item.product_id)
            })?;
        if !p.is_active {
            return Err(AppError::with_message(
                ErrorCode::ProductInactive,
                format!("{} is not available for sale", p.name),
            )
            .with_detail("product_id", p.id));
        }
        products.insert(p.id, p);
    }
    Ok(products)
}

/// Complement lines must point at a principal in the same order, and every
/// principal must carry its mandatory complements.
async fn check_complements(conn: &mut SqliteConnection, items: &[OrderItemInput]) -> AppResult<()> {
    for item in items {
        if let Some(principal) = item.complement_of
            && !items
                .iter()
                .any(|i| i.product_id == principal && i.complement_of.is_none())
        {
            return Err(AppError::with_message(
                ErrorCode::OrderItemInvalid,
                "Complement line without its principal product",
            )
            .with_detail("product_id", item.product_id)
            .with_detail("complement_of", principal));
        }
    }

    for principal in items.iter().filter(|i| i.complement_of.is_none()) {
        let complements = product::find_complements(&mut *conn, principal.product_id).await?;
        for required in complements.iter().filter(|c| c.is_mandatory) {
            let present = items.iter().any(|i| {
                i.product_id == required.complement_id
                    && i.complement_of == Some(principal.product_id)
            });
            if !present {
                return Err(AppError::with_message(
                    ErrorCode::OrderItemInvalid,
                    "Missing mandatory complement",
                )
                .with_detail("product_id", principal.product_id)
                .with_detail("complement_id", required.complement_id));
            }
        }
    }
    Ok(())
}

/// Unit price for a line and whether it is a free complement
async fn price_line(
    conn: &mut SqliteConnection,
    item: &OrderItemInput,
    product: &Product,
) -> AppResult<(f64, bool)> {
    let Some(principal) = item.complement_of else {
        return Ok((product.price, false));
    };
    let relation = product::find_complement(&mut *conn, principal, item.product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::OrderItemInvalid,
                format!("{} is not a complement of product {principal}", product.name),
            )
            .with_detail("product_id", item.product_id)
        })?;
    if relation.is_free {
        Ok((0.0, true))
    } else {
        Ok((product.price, false))
    }
}

/// Record the sale against tracked stock
///
/// Combos consume each component (`venta_combo`); normal products with a
/// stock row consume themselves (`venta`); untracked products are skipped.
async fn consume_stock(
    conn: &mut SqliteConnection,
    product: &Product,
    quantity: i64,
    order_id: i64,
    actor_id: i64,
) -> AppResult<()> {
    if product.is_combo {
        let states = product::component_states(&mut *conn, product.id).await?;
        let shortages = StockResolver::shortages(&states, quantity);
        if !shortages.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::ProductOutOfStock,
                format!("{} is not available", product.name),
            )
            .with_detail("product_id", product.id)
            .with_detail("shortages", serde_json::to_value(&shortages).unwrap_or_default()));
        }
        for component in &states {
            apply_sale(
                conn,
                component.component_id,
                MovementType::VentaCombo,
                component.required.saturating_mul(quantity),
                order_id,
                actor_id,
            )
            .await?;
        }
        return Ok(());
    }

    if inventory::find_by_product(&mut *conn, product.id).await?.is_some() {
        apply_sale(conn, product.id, MovementType::Venta, quantity, order_id, actor_id).await?;
    }
    Ok(())
}

async fn apply_sale(
    conn: &mut SqliteConnection,
    product_id: i64,
    movement_type: MovementType,
    quantity: i64,
    order_id: i64,
    actor_id: i64,
) -> AppResult<()> {
    let outcome = inventory::record_movement(
        conn,
        NewMovement {
            product_id,
            movement_type,
            quantity,
            reason: None,
            user_id: actor_id,
            order_id: Some(order_id),
        },
    )
    .await?;
    match outcome {
        MovementOutcome::Applied(_) => Ok(()),
        MovementOutcome::Insufficient { on_hand } => Err(AppError::new(ErrorCode::InsufficientStock)
            .with_detail("product_id", product_id)
            .with_detail("required", quantity)
            .with_detail("on_hand", on_hand)),
    }
}

/// Write `subtotal = Σ line subtotals`, `total = subtotal` (tax = discount = 0)
async fn recompute_in(conn: &mut SqliteConnection, order_id: i64) -> AppResult<(f64, f64)> {
    let subtotal = money::sum(order::item_subtotals(&mut *conn, order_id).await?);
    let total = money::order_total(subtotal, 0.0, 0.0);
    if !order::update_totals(&mut *conn, order_id, subtotal, total).await? {
        return Err(order_not_found(order_id));
    }
    Ok((subtotal, total))
}

async fn load_detail(conn: &mut SqliteConnection, order_id: i64) -> AppResult<OrderDetail> {
    let order = find_order(conn, order_id).await?;
    let items = order::find_items(&mut *conn, order_id).await?;
    Ok(OrderDetail { order, items })
}

/// Full dashboard view of one order
pub(crate) async fn load_snapshot(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> AppResult<OrderSnapshot> {
    let header = order::snapshot_header(&mut *conn, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    let items = order::snapshot_items(&mut *conn, order_id).await?;
    let o = header.order;

    Ok(OrderSnapshot {
        id: o.id,
        numero_orden: o.order_number,
        estado: o.status,
        mesa_id: o.table_id,
        mesa_numero: header.table_number,
        usuario_id: o.user_id,
        usuario_nombre: header.user_name,
        usuario_rol: header.user_role,
        subtotal: o.subtotal,
        total: o.subtotal,
        pagado: o.is_paid,
        version: o.version,
        created_at: o.created_at,
        updated_at: o.updated_at,
        productos: items
            .into_iter()
            .map(|i| OrderSnapshotItem {
                id: i.id,
                nombre: i.product_name,
                categoria: i.category_name,
                color: i
                    .category_color
                    .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
                precio: i.unit_price,
                cantidad: i.quantity,
                subtotal: i.subtotal,
                notas: i.notes,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests;
