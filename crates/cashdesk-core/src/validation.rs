//! # Validation Module
//!
//! Input validation for cash register operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (admin console, sale subsystem)                       │
//! │  └── Form checks, immediate feedback                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, before any write)                         │
//! │  ├── amounts, ids, free text                                           │
//! │  └── catalog references (see catalog::Catalog::resolve)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (amount_cents > 0)                                          │
//! │  ├── UNIQUE (branch_id) WHERE status = 'open'                          │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewMovement;
use crate::{MAX_AMOUNT, MAX_DESCRIPTION_LEN, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates a movement amount.
///
/// ## Rules
/// - Must be positive (> 0). Direction comes from the movement type, never
///   from the sign.
/// - At most [`MAX_AMOUNT`]
///
/// ## Example
/// ```rust
/// use cashdesk_core::money::Money;
/// use cashdesk_core::validation::validate_movement_amount;
///
/// assert!(validate_movement_amount(Money::from_cents(1)).is_ok());
/// assert!(validate_movement_amount(Money::zero()).is_err());
/// assert!(validate_movement_amount(Money::from_cents(-500)).is_err());
/// assert!(validate_movement_amount(Money::from_cents(i64::MAX)).is_err());
/// ```
pub fn validate_movement_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    within_max("amount", amount)
}

/// Validates the cash placed in the drawer when opening.
///
/// ## Rules
/// - Zero is allowed (register opened empty)
/// - Negative is not
/// - At most [`MAX_AMOUNT`]
pub fn validate_initial_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "initial_amount".to_string(),
        });
    }

    within_max("initial_amount", amount)
}

/// Validates the physically counted cash at close.
///
/// ## Rules
/// - Must not be negative: a drawer cannot hold less than nothing
/// - At most [`MAX_AMOUNT`]
pub fn validate_counted_cash(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "counted_cash".to_string(),
        });
    }

    within_max("counted_cash", amount)
}

fn within_max(field: &str, amount: Money) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_AMOUNT,
        });
    }

    Ok(())
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an opaque reference supplied by the branch/user directory.
///
/// ## Rules
/// - Must not be blank
/// - At most 64 characters
pub fn validate_reference(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates closing notes.
///
/// ## Returns
/// The trimmed notes, or `None` when blank.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(Some(notes.to_string()))
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a movement request (everything that does not need the catalog).
///
/// ## Rules
/// - 0 < amount <= MAX_AMOUNT
/// - description at most MAX_DESCRIPTION_LEN characters
/// - a movement cannot point at both a sale and a purchase order
pub fn validate_new_movement(movement: &NewMovement) -> ValidationResult<()> {
    validate_movement_amount(movement.amount)?;

    if movement.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    if movement.sale_id.is_some() && movement.purchase_order_id.is_some() {
        return Err(ValidationError::MutuallyExclusive {
            first: "sale_id".to_string(),
            second: "purchase_order_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amounts() {
        assert!(validate_movement_amount(Money::from_cents(1)).is_ok());
        assert!(validate_movement_amount(Money::zero()).is_err());

        assert!(validate_initial_amount(Money::zero()).is_ok());
        assert!(validate_initial_amount(Money::from_cents(-1)).is_err());

        assert!(validate_counted_cash(Money::zero()).is_ok());
        assert!(validate_counted_cash(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_amounts_are_bounded() {
        assert!(validate_movement_amount(MAX_AMOUNT).is_ok());
        assert!(validate_initial_amount(MAX_AMOUNT).is_ok());
        assert!(validate_counted_cash(MAX_AMOUNT).is_ok());

        let over = Money::from_cents(MAX_AMOUNT.cents() + 1);
        assert!(matches!(
            validate_movement_amount(over),
            Err(ValidationError::TooLarge { .. })
        ));
        assert!(validate_initial_amount(over).is_err());
        assert!(validate_counted_cash(over).is_err());

        let huge = NewMovement::new(1, 1, Money::from_cents(i64::MAX / 2 + 1), "sale");
        assert!(matches!(
            validate_new_movement(&huge),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference("branch_id", "north-01").is_ok());
        assert!(validate_reference("branch_id", "  ").is_err());
        assert!(validate_reference("branch_id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes(None).unwrap(), None);
        assert_eq!(validate_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_notes(Some(" short by 2 ")).unwrap().as_deref(),
            Some("short by 2")
        );
        assert!(validate_notes(Some(&"n".repeat(MAX_NOTES_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_new_movement() {
        let ok = NewMovement::new(1, 1, Money::from_cents(100), "sale");
        assert!(validate_new_movement(&ok).is_ok());

        let zero = NewMovement::new(1, 1, Money::zero(), "sale");
        assert!(matches!(
            validate_new_movement(&zero),
            Err(ValidationError::MustBePositive { .. })
        ));

        let both = ok.clone().with_sale("s").with_purchase_order("p");
        assert!(matches!(
            validate_new_movement(&both),
            Err(ValidationError::MutuallyExclusive { .. })
        ));

        let long = NewMovement::new(1, 1, Money::from_cents(1), "d".repeat(MAX_DESCRIPTION_LEN + 1));
        assert!(validate_new_movement(&long).is_err());
    }
}
