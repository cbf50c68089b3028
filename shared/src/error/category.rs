//! 错误领域划分

use serde::{Deserialize, Serialize};

use super::codes::ErrorCode;

/// Domain of an error code, taken from its thousands digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Permission,
    /// Currencies and settings
    Config,
    Order,
    /// Checkout and cash register
    Cash,
    /// Products, categories and stock
    Catalog,
    /// Dining tables
    Floor,
    /// Users and roles
    Staff,
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::General,
            1 => Self::Auth,
            2 => Self::Permission,
            3 => Self::Config,
            4 => Self::Order,
            5 => Self::Cash,
            6 => Self::Catalog,
            7 => Self::Floor,
            8 => Self::Staff,
            _ => Self::System,
        }
    }

    /// Errors the operator can fix by changing the request
    pub fn is_client_side(&self) -> bool {
        !matches!(self, Self::System)
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
