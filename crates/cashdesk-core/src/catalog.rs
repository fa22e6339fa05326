//! # Movement Catalog
//!
//! Read-only reference data: movement types and payment methods.
//!
//! The catalog is loaded once (from the database or [`Catalog::standard`])
//! and then only looked up. It answers three questions for the rest of the
//! engine:
//! - is this movement type / payment method known and usable?
//! - which payment method is the physical cash drawer?
//! - which types may an operator pick by hand?

use std::collections::BTreeMap;

use crate::error::{CoreResult, ValidationError};
use crate::types::{MovementOrigin, MovementType, NewMovement, OperationType, PaymentMethod};

/// Lookup tables for movement types and payment methods.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movement_types: BTreeMap<i64, MovementType>,
    payment_methods: BTreeMap<i64, PaymentMethod>,
    cash_method_id: Option<i64>,
}

impl Catalog {
    /// Builds a catalog.
    ///
    /// ## Errors
    /// `InvalidFormat` if more than one payment method is flagged as cash:
    /// the drawer count can only be matched against a single figure.
    pub fn new(
        movement_types: impl IntoIterator<Item = MovementType>,
        payment_methods: impl IntoIterator<Item = PaymentMethod>,
    ) -> Result<Self, ValidationError> {
        let payment_methods: BTreeMap<i64, PaymentMethod> =
            payment_methods.into_iter().map(|p| (p.id, p)).collect();

        let mut cash = payment_methods.values().filter(|p| p.is_cash);
        let cash_method_id = cash.next().map(|p| p.id);
        if cash.next().is_some() {
            return Err(ValidationError::InvalidFormat {
                field: "payment methods".to_string(),
                reason: "only one payment method may be flagged as cash".to_string(),
            });
        }

        Ok(Catalog {
            movement_types: movement_types.into_iter().map(|t| (t.id, t)).collect(),
            payment_methods,
            cash_method_id,
        })
    }

    /// The stock catalog shipped with the seed data.
    ///
    /// Names follow the Spanish-speaking deployments the product started
    /// with; the flags are what the engine actually reads.
    pub fn standard() -> Self {
        let ty = |id, name: &str, op, cash, account, origin| MovementType {
            id,
            name: name.to_string(),
            operation_type: op,
            is_cash_movement: cash,
            is_current_account_movement: account,
            origin,
            active: true,
        };
        let pm = |id, name: &str, is_cash| PaymentMethod {
            id,
            name: name.to_string(),
            is_cash,
        };

        use MovementOrigin::{Automatic, Manual};
        use OperationType::{Entrada, Salida};

        Catalog {
            movement_types: [
                ty(1, "Venta", Entrada, true, false, Automatic),
                ty(2, "Compra", Salida, true, false, Automatic),
                ty(3, "Ingreso de efectivo", Entrada, true, false, Manual),
                ty(4, "Retiro de efectivo", Salida, true, false, Manual),
                ty(5, "Gasto", Salida, true, false, Manual),
                ty(6, "Cobro cuenta corriente", Entrada, true, true, Automatic),
                ty(7, "Venta a cuenta corriente", Entrada, false, true, Automatic),
                ty(8, "Devolucion", Salida, true, false, Manual),
            ]
            .into_iter()
            .map(|t| (t.id, t))
            .collect(),
            payment_methods: [
                pm(1, "Efectivo", true),
                pm(2, "Tarjeta", false),
                pm(3, "Transferencia", false),
                pm(4, "Cheque", false),
            ]
            .into_iter()
            .map(|p| (p.id, p))
            .collect(),
            cash_method_id: Some(1),
        }
    }

    pub fn movement_type(&self, id: i64) -> Option<&MovementType> {
        self.movement_types.get(&id)
    }

    pub fn payment_method(&self, id: i64) -> Option<&PaymentMethod> {
        self.payment_methods.get(&id)
    }

    pub fn movement_types(&self) -> impl Iterator<Item = &MovementType> {
        self.movement_types.values()
    }

    pub fn payment_methods(&self) -> impl Iterator<Item = &PaymentMethod> {
        self.payment_methods.values()
    }

    /// The payment method whose totals feed the physical count.
    pub fn cash_method(&self) -> Option<&PaymentMethod> {
        self.cash_method_id.and_then(|id| self.payment_methods.get(&id))
    }

    /// Active types offered in manual-entry forms.
    pub fn manual_types(&self) -> Vec<&MovementType> {
        self.movement_types.values().filter(|t| t.is_manual()).collect()
    }

    /// Active types only the sale/purchase subsystem may write.
    pub fn automatic_types(&self) -> Vec<&MovementType> {
        self.movement_types
            .values()
            .filter(|t| t.active && t.origin == MovementOrigin::Automatic)
            .collect()
    }

    /// Resolves the catalog references of a movement request.
    ///
    /// ## Errors
    /// - `UnknownReference` for a missing movement type or payment method
    /// - `Inactive` for a disabled movement type
    pub fn resolve(
        &self,
        movement: &NewMovement,
    ) -> CoreResult<(&MovementType, &PaymentMethod)> {
        let kind = self
            .movement_type(movement.movement_type_id)
            .ok_or_else(|| ValidationError::UnknownReference {
                field: "movement type".to_string(),
                value: movement.movement_type_id.to_string(),
            })?;

        if !kind.active {
            return Err(ValidationError::Inactive {
                field: "movement type".to_string(),
                value: kind.name.clone(),
            }
            .into());
        }

        let method = self
            .payment_method(movement.payment_method_id)
            .ok_or_else(|| ValidationError::UnknownReference {
                field: "payment method".to_string(),
                value: movement.payment_method_id.to_string(),
            })?;

        Ok((kind, method))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
