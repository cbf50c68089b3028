//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback color for line items whose category has no color
pub const DEFAULT_CATEGORY_COLOR: &str = "#6c757d";

/// Order lifecycle status
///
/// `Pending → InProgress → Ready → Delivered`, with `Cancelled` reachable
/// from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum OrderStatus {
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "db", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "en_proceso")]
    #[cfg_attr(feature = "db", sqlx(rename = "en_proceso"))]
    InProgress,
    #[serde(rename = "lista")]
    #[cfg_attr(feature = "db", sqlx(rename = "lista"))]
    Ready,
    #[serde(rename = "entregada")]
    #[cfg_attr(feature = "db", sqlx(rename = "entregada"))]
    Delivered,
    #[serde(rename = "cancelada")]
    #[cfg_attr(feature = "db", sqlx(rename = "cancelada"))]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Statuses shown on the bartender/cashier dashboards
    pub const ACTIVE: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Ready,
    ];

    /// Statuses that keep a table occupied
    pub const OCCUPYING: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::InProgress];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::InProgress => "en_proceso",
            OrderStatus::Ready => "lista",
            OrderStatus::Delivered => "entregada",
            OrderStatus::Cancelled => "cancelada",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::InProgress | OrderStatus::Ready
        )
    }

    pub const fn occupies_table(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::InProgress)
    }

    /// Reaching this status frees the order's table (if nothing else holds it)
    pub const fn releases_table(&self) -> bool {
        self.is_terminal()
    }

    /// Position along the forward chain; `None` for `Cancelled`
    const fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::InProgress => Some(1),
            OrderStatus::Ready => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Transition table
    ///
    /// Forward moves may skip steps (`pendiente → entregada`), cancelling is
    /// allowed from any non-terminal status, terminal statuses never change
    /// and backward or same-status moves are rejected.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method recorded at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Tarjeta => "tarjeta",
            PaymentMethod::Transferencia => "transferencia",
        }
    }

    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Efectivo)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Human readable number, `ORD-YYYYMMDD-XXXXXX`
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub payment_method: Option<PaymentMethod>,
    pub is_paid: bool,
    pub notes: Option<String>,
    /// `None` for pickup orders
    pub table_id: Option<i64>,
    /// Creator (waiter/cashier)
    pub user_id: i64,
    pub bartender_id: Option<i64>,
    /// Optimistic concurrency token, bumped on every status change
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub notes: Option<String>,
    pub is_free_complement: bool,
    /// Principal product this line complements
    pub complement_of: Option<i64>,
}

/// History action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum HistoryAction {
    Created,
    StatusChanged,
    Paid,
    ItemsRecalculated,
}

/// Append-only audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderHistory {
    pub id: i64,
    pub order_id: i64,
    /// Actor
    pub user_id: i64,
    pub action: HistoryAction,
    pub detail: String,
    pub created_at: i64,
}

/// Requested line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i64,
    pub notes: Option<String>,
    /// Principal product when this line is a complement
    pub complement_of: Option<i64>,
}

/// Create order payload (cart submission)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_id: Option<i64>,
    pub bartender_id: Option<i64>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    /// Version the caller last saw; omitted means "current"
    pub expected_version: Option<i64>,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayment {
    pub payment_method: PaymentMethod,
}

/// List filter (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i64>,
    pub is_paid: Option<bool>,
    pub limit: Option<i64>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Full order view pushed to dashboards
///
/// Keys follow the dashboard contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: i64,
    pub numero_orden: String,
    pub estado: OrderStatus,
    pub mesa_id: Option<i64>,
    pub mesa_numero: Option<i64>,
    pub usuario_id: i64,
    pub usuario_nombre: Option<String>,
    pub usuario_rol: Option<String>,
    pub subtotal: f64,
    /// Same as subtotal while tax and discount are zero
    pub total: f64,
    pub pagado: bool,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub productos: Vec<OrderSnapshotItem>,
}

/// Snapshot line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshotItem {
    pub id: i64,
    pub nombre: String,
    pub categoria: Option<String>,
    pub color: String,
    pub precio: f64,
    pub cantidad: i64,
    pub subtotal: f64,
    pub notas: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_moves_are_allowed() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(Pending.can_transition_to(Delivered));
        assert!(InProgress.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Delivered));
    }

    #[test]
    fn cancel_from_any_non_terminal() {
        use OrderStatus::*;
        for from in [Pending, InProgress, Ready] {
            assert!(from.can_transition_to(Cancelled), "{from} -> cancelada");
        }
    }

    #[test]
    fn terminal_and_backward_moves_are_rejected() {
        use OrderStatus::*;
        for to in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
        assert!(!Ready.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(InProgress));
    }

    #[test]
    fn status_groups() {
        assert!(OrderStatus::Ready.is_active());
        assert!(!OrderStatus::Ready.occupies_table());
        assert!(OrderStatus::InProgress.occupies_table());
        assert!(OrderStatus::Cancelled.releases_table());
        assert!(!OrderStatus::Delivered.is_active());
    }

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"en_proceso\""
        );
        let st: OrderStatus = serde_json::from_str("\"entregada\"").unwrap();
        assert_eq!(st, OrderStatus::Delivered);
        assert_eq!(OrderStatus::parse("lista"), Some(OrderStatus::Ready));
        assert_eq!(OrderStatus::parse("served"), None);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transferencia).unwrap(),
            "\"transferencia\""
        );
    }
}
