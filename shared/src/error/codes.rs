//! Unified error codes for the POS server
//!
//! Error codes are shared with the dashboards (bartender, cashier, waiter)
//! and organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Configuration errors (currencies, settings)
//! - 4xxx: Order errors
//! - 5xxx: Payment and cash register errors
//! - 6xxx: Product, category and inventory errors
//! - 7xxx: Table errors
//! - 8xxx: User and role errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Configuration ====================
    /// Currency not found
    CurrencyNotFound = 3001,
    /// Currency code already registered
    CurrencyCodeExists = 3002,
    /// Setting key not found
    SettingNotFound = 3101,
    /// Setting value does not match its declared type
    SettingTypeMismatch = 3102,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Requested status change is not allowed from the current status
    OrderInvalidTransition = 4003,
    /// Order was modified concurrently (stale version)
    OrderVersionConflict = 4004,
    /// Order has no items
    OrderEmpty = 4007,
    /// Order line item is invalid
    OrderItemInvalid = 4008,

    // ==================== 5xxx: Payment ====================
    /// Payment method is not supported
    PaymentInvalidMethod = 5003,
    /// No cash register is open
    CashRegisterNotOpen = 5101,
    /// A cash register is already open
    CashRegisterAlreadyOpen = 5102,
    /// Cash register not found
    CashRegisterNotFound = 5103,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product price is invalid
    ProductInvalidPrice = 6002,
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Product code already in use
    ProductCodeExists = 6004,
    /// Combo component is invalid (self reference, combo inside combo, ...)
    ComboInvalidComponent = 6005,
    /// Product is inactive
    ProductInactive = 6006,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category still has products
    CategoryHasProducts = 6102,
    /// Stock movement would leave a negative quantity
    InsufficientStock = 6201,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied
    TableOccupied = 7002,
    /// Table cannot accept orders right now (reserved, inactive, busy)
    TableNotAvailable = 7003,
    /// Table still has active orders
    TableHasActiveOrders = 7004,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Username already exists
    UsernameExists = 8002,
    /// Role not found
    RoleNotFound = 8101,
    /// Role slug already exists
    RoleNameExists = 8102,
    /// Role still assigned to users
    RoleInUse = 8103,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Message bus is not accepting messages
    BusUnavailable = 9301,
}

impl ErrorCode {
    /// Get the numeric code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Configuration
            ErrorCode::CurrencyNotFound => "Currency not found",
            ErrorCode::CurrencyCodeExists => "Currency code already exists",
            ErrorCode::SettingNotFound => "Setting not found",
            ErrorCode::SettingTypeMismatch => "Setting value does not match its type",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderInvalidTransition => "Order status change is not allowed",
            ErrorCode::OrderVersionConflict => "Order was modified by another operator",
            ErrorCode::OrderEmpty => "Order has no items",
            ErrorCode::OrderItemInvalid => "Order item is invalid",

            // Payment
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::CashRegisterNotOpen => "No cash register is open",
            ErrorCode::CashRegisterAlreadyOpen => "A cash register is already open",
            ErrorCode::CashRegisterNotFound => "Cash register not found",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Invalid product price",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductCodeExists => "Product code already exists",
            ErrorCode::ComboInvalidComponent => "Invalid combo component",
            ErrorCode::ProductInactive => "Product is inactive",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category has products",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::TableNotAvailable => "Table cannot accept orders",
            ErrorCode::TableHasActiveOrders => "Table has active orders",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::RoleNameExists => "Role already exists",
            ErrorCode::RoleInUse => "Role is assigned to users",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::BusUnavailable => "Message bus unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // Configuration
            3001 => Ok(ErrorCode::CurrencyNotFound),
            3002 => Ok(ErrorCode::CurrencyCodeExists),
            3101 => Ok(ErrorCode::SettingNotFound),
            3102 => Ok(ErrorCode::SettingTypeMismatch),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyPaid),
            4003 => Ok(ErrorCode::OrderInvalidTransition),
            4004 => Ok(ErrorCode::OrderVersionConflict),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderItemInvalid),

            // Payment
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5101 => Ok(ErrorCode::CashRegisterNotOpen),
            5102 => Ok(ErrorCode::CashRegisterAlreadyOpen),
            5103 => Ok(ErrorCode::CashRegisterNotFound),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductCodeExists),
            6005 => Ok(ErrorCode::ComboInvalidComponent),
            6006 => Ok(ErrorCode::ProductInactive),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasProducts),
            6201 => Ok(ErrorCode::InsufficientStock),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7003 => Ok(ErrorCode::TableNotAvailable),
            7004 => Ok(ErrorCode::TableHasActiveOrders),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UsernameExists),
            8101 => Ok(ErrorCode::RoleNotFound),
            8102 => Ok(ErrorCode::RoleNameExists),
            8103 => Ok(ErrorCode::RoleInUse),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9301 => Ok(ErrorCode::BusUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
