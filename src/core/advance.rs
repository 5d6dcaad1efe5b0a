//! Salary advance lifecycle and balance derivation.
//!
//! An advance moves requested -> granted -> disbursed -> settled. The
//! outstanding balance is never stored; it is derived from the granted
//! amount minus the recorded repayment rows, so undoing a calculation
//! automatically restores what the employee owes. Settlement happens as a
//! by-product of slip calculation, there is no manual settle operation.

use crate::{
    core::employee::get_employee,
    entities::{Advance, AdvanceColumn, AdvanceStatus, Repayment, RepaymentColumn, advance},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
};
use tracing::info;

/// Balances at or below this are considered fully repaid.
pub const SETTLEMENT_EPSILON: Decimal = dec!(0.01);

/// A salary advance request.
#[derive(Debug, Clone)]
pub struct NewAdvance {
    /// Requesting employee
    pub employee_id: i64,
    /// Amount asked for
    pub amount: Decimal,
    /// Number of monthly repayment installments
    pub installments: i32,
    /// Free-form justification
    pub reason: Option<String>,
}

/// Records an advance request for an active employee.
///
/// # Errors
/// Returns `Error::InvalidAmount` for a non-positive amount,
/// `Error::Configuration` for zero installments or an inactive employee.
pub async fn request_advance(db: &DatabaseConnection, new: NewAdvance) -> Result<advance::Model> {
    if new.amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: new.amount });
    }
    if new.installments < 1 {
        return Err(Error::Configuration {
            message: format!("installments must be at least 1, got {}", new.installments),
        });
    }
    let employee = get_employee(db, new.employee_id).await?;
    if !employee.is_active {
        return Err(Error::Configuration {
            message: format!("employee {} is not active", employee.id),
        });
    }

    let created = advance::ActiveModel {
        employee_id: Set(new.employee_id),
        requested_amount: Set(new.amount),
        reason: Set(new.reason),
        installments: Set(new.installments),
        status: Set(AdvanceStatus::Requested),
        requested_on: Set(Utc::now().date_naive()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        advance_id = created.id,
        employee_id = created.employee_id,
        amount = %created.requested_amount,
        "advance requested"
    );
    Ok(created)
}

/// Grants a requested advance, fixing the repayment schedule.
///
/// The granted amount may differ from the requested one. The per-period
/// installment is the granted amount split evenly and rounded to two
/// decimals; the final repayment absorbs the rounding remainder because
/// each repayment is capped at the balance still owed.
pub async fn grant_advance(
    db: &DatabaseConnection,
    advance_id: i64,
    granted_amount: Decimal,
    approved_by: Option<i64>,
    granted_on: NaiveDate,
) -> Result<advance::Model> {
    if granted_amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount {
            amount: granted_amount,
        });
    }
    let advance = get_advance(db, advance_id).await?;
    if advance.status != AdvanceStatus::Requested {
        return Err(Error::InvalidTransition {
            entity: "advance",
            from: advance.status.to_string(),
            attempted: "grant",
        });
    }

    let installment_amount = (granted_amount / Decimal::from(advance.installments)).round_dp(2);
    let mut model = advance.into_active_model();
    model.granted_amount = Set(Some(granted_amount));
    model.installment_amount = Set(Some(installment_amount));
    model.status = Set(AdvanceStatus::Granted);
    model.granted_on = Set(Some(granted_on));
    model.approved_by = Set(approved_by);

    let updated = model.update(db).await?;
    info!(
        advance_id = updated.id,
        granted = %granted_amount,
        installment = %installment_amount,
        "advance granted"
    );
    Ok(updated)
}

/// Marks a granted advance as paid out to the employee.
pub async fn disburse_advance(
    db: &DatabaseConnection,
    advance_id: i64,
    disbursed_on: NaiveDate,
) -> Result<advance::Model> {
    let advance = get_advance(db, advance_id).await?;
    if advance.status != AdvanceStatus::Granted {
        return Err(Error::InvalidTransition {
            entity: "advance",
            from: advance.status.to_string(),
            attempted: "disburse",
        });
    }

    let mut model = advance.into_active_model();
    model.status = Set(AdvanceStatus::Disbursed);
    model.disbursed_on = Set(Some(disbursed_on));

    let updated = model.update(db).await?;
    info!(advance_id = updated.id, "advance disbursed");
    Ok(updated)
}

/// Fetches an advance by id.
///
/// # Errors
/// Returns `Error::AdvanceNotFound` for an unknown id.
pub async fn get_advance<C: ConnectionTrait>(db: &C, id: i64) -> Result<advance::Model> {
    Advance::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::AdvanceNotFound { id })
}

/// Derives what the employee still owes on an advance: the granted amount
/// minus every recorded repayment. Zero for advances not yet granted.
pub async fn outstanding_balance<C: ConnectionTrait>(
    db: &C,
    advance: &advance::Model,
) -> Result<Decimal> {
    let Some(granted) = advance.granted_amount else {
        return Ok(Decimal::ZERO);
    };
    let repaid: Decimal = Repayment::find()
        .filter(RepaymentColumn::AdvanceId.eq(advance.id))
        .all(db)
        .await?
        .iter()
        .map(|row| row.amount)
        .sum();
    Ok(granted - repaid)
}

/// Lists the advances a calculation must collect on, oldest first, each
/// paired with its outstanding balance. Only granted or disbursed advances
/// with a balance above the settlement epsilon qualify.
pub async fn due_advances<C: ConnectionTrait>(
    db: &C,
    employee_id: i64,
) -> Result<Vec<(advance::Model, Decimal)>> {
    let candidates = Advance::find()
        .filter(AdvanceColumn::EmployeeId.eq(employee_id))
        .filter(AdvanceColumn::Status.is_in([AdvanceStatus::Granted, AdvanceStatus::Disbursed]))
        .order_by_asc(AdvanceColumn::Id)
        .all(db)
        .await?;

    let mut due = Vec::new();
    for advance in candidates {
        let outstanding = outstanding_balance(db, &advance).await?;
        if outstanding > SETTLEMENT_EPSILON {
            due.push((advance, outstanding));
        }
    }
    Ok(due)
}
