//! # Error Types
//!
//! Domain errors for shop-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shop-core errors (this file)                                          │
//! │  ├── CoreError        - Rule violations (locked vehicle, capacity)     │
//! │  └── ValidationError  - Malformed user input                           │
//! │                                                                         │
//! │  shop-sync errors (separate crate)                                     │
//! │  └── SyncError        - Validation / CommitRejected / Transport        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → notification text     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is detected locally, before anything is sent to the
//! authoritative boundary.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations found while deriving or checking local state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Inventory item id is not present in the current snapshot.
    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    /// Delivery vehicle key is not configured for this shop.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    /// The vehicle exists but has not been unlocked by the shop.
    ///
    /// ## User Workflow
    /// ```text
    /// Pick vehicle "mule" for a delivery
    ///      │
    ///      ▼
    /// ownership["mule"].unlocked == false
    ///      │
    ///      ▼
    /// VehicleLocked("mule") → submit stays disabled
    /// ```
    #[error("Vehicle {0} is not unlocked")]
    VehicleLocked(String),

    /// The vehicle is already unlocked; unlocking again is refused.
    #[error("Vehicle {0} is already unlocked")]
    VehicleAlreadyUnlocked(String),

    /// Shop level is below the vehicle's requirement.
    #[error("Level {required} required, shop is level {current}")]
    LevelTooLow { required: u32, current: u32 },

    /// No stock left for the requested item.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Delivery submitted without a vehicle.
    #[error("No delivery vehicle selected")]
    NoVehicleSelected,

    /// Delivery submitted without any usable line.
    #[error("Delivery has no items")]
    EmptyManifest,

    /// Manifest total exceeds the vehicle's capacity.
    #[error("Manifest total {total} exceeds vehicle capacity {capacity}")]
    OverCapacity { total: i64, capacity: i64 },

    /// Delivery id is not present in the current snapshot.
    #[error("Delivery not found: {0}")]
    DeliveryNotFound(String),

    /// Only pending deliveries can be started.
    #[error("Delivery {0} is not pending")]
    DeliveryNotPending(String),

    /// Cart checkout attempted with nothing in it.
    #[error("Cart is empty")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., an identifier another shop already uses).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OverCapacity {
            total: 80,
            capacity: 70,
        };
        assert_eq!(
            err.to_string(),
            "Manifest total 80 exceeds vehicle capacity 70"
        );

        let err = CoreError::LevelTooLow {
            required: 3,
            current: 1,
        };
        assert_eq!(err.to_string(), "Level 3 required, shop is level 1");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "identifier".to_string(),
        };
        assert_eq!(err.to_string(), "identifier is required");

        let err = ValidationError::Duplicate {
            field: "identifier".to_string(),
            value: "my_shop".to_string(),
        };
        assert_eq!(err.to_string(), "identifier 'my_shop' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
