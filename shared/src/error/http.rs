//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::TableNotFound
            | Self::UserNotFound
            | Self::RoleNotFound
            | Self::CurrencyNotFound
            | Self::SettingNotFound
            | Self::CashRegisterNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderAlreadyPaid
            | Self::OrderVersionConflict
            | Self::ProductCodeExists
            | Self::CategoryHasProducts
            | Self::CurrencyCodeExists
            | Self::UsernameExists
            | Self::RoleNameExists
            | Self::RoleInUse
            | Self::CashRegisterAlreadyOpen
            | Self::TableOccupied
            | Self::TableHasActiveOrders => StatusCode::CONFLICT,

            // 422 Unprocessable Entity (business rule violations)
            Self::OrderInvalidTransition
            | Self::InsufficientStock
            | Self::ProductOutOfStock
            | Self::ProductInactive
            | Self::TableNotAvailable
            | Self::CashRegisterNotOpen => StatusCode::UNPROCESSABLE_ENTITY,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            // 503 Service Unavailable
            Self::BusUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::TableNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::SettingNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::OrderVersionConflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::OrderAlreadyPaid.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::TableHasActiveOrders.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_business_rule_status() {
        assert_eq!(
            ErrorCode::OrderInvalidTransition.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_auth_status() {
        assert_eq!(ErrorCode::NotAuthenticated.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_default_bad_request() {
        assert_eq!(ErrorCode::ValidationFailed.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::OrderEmpty.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::DatabaseError.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
