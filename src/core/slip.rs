//! Pay slip lifecycle: drafting, calculation, validation, payment.
//!
//! A slip is strictly linear: draft -> validated -> paid. While it is a
//! draft its inputs may change and it may be recalculated any number of
//! times. Recalculation is undo-then-redo: the slip's own line items and
//! repayment rows are deleted first, which restores any advance balance
//! the previous run consumed, then everything is rebuilt from the current
//! inputs. All of it happens in one transaction, so a failure leaves no
//! partial slip and no stale ledger.

use crate::{
    core::{
        advance::{self, SETTLEMENT_EPSILON},
        config, contribution,
        employee::get_employee,
        line_items::{self, DueAdvance, SlipInputs, build_line_items},
    },
    entities::{
        AdvanceStatus, LineItem, LineItemColumn, PaySlip, PaySlipColumn, PaymentMethod, Repayment,
        RepaymentColumn, SlipAction, SlipHistory, SlipHistoryColumn, SlipStatus, employee,
        line_item, pay_slip, repayment, slip_history,
    },
    errors::{Error, Result},
    notify::SlipNotifier,
};
use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
    TransactionTrait,
};
use tracing::{info, warn};

/// Everything needed to open a draft slip for one employee and period.
#[derive(Debug, Clone)]
pub struct NewSlip {
    /// Employee the slip is for
    pub employee_id: i64,
    /// Period month, 1-12
    pub month: i32,
    /// Period year
    pub year: i32,
    /// Days actually worked
    pub worked_days: Decimal,
    /// Working days in the period
    pub standard_days: i32,
    /// Overtime hours
    pub overtime_hours: Decimal,
    /// Bonuses
    pub bonuses: Decimal,
    /// Allowances
    pub allowances: Decimal,
    /// Benefits in kind
    pub benefits_in_kind: Decimal,
    /// Miscellaneous deductions
    pub misc_deductions: Decimal,
    /// Who opened the draft
    pub created_by: Option<i64>,
}

/// A partial update to a draft slip's inputs. `None` fields keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct SlipInputsPatch {
    /// Days actually worked
    pub worked_days: Option<Decimal>,
    /// Working days in the period
    pub standard_days: Option<i32>,
    /// Overtime hours
    pub overtime_hours: Option<Decimal>,
    /// Bonuses
    pub bonuses: Option<Decimal>,
    /// Allowances
    pub allowances: Option<Decimal>,
    /// Benefits in kind
    pub benefits_in_kind: Option<Decimal>,
    /// Miscellaneous deductions
    pub misc_deductions: Option<Decimal>,
}

/// Opens a draft slip with zeroed totals. Totals stay zero until
/// [`calculate_slip`] runs; creation never calculates.
///
/// # Errors
/// Returns `Error::DuplicateSlip` when the employee already has a slip for
/// the period (checked up front and backstopped by the unique index),
/// `Error::Configuration` for an invalid month or inactive employee, and
/// the usual validation errors for the inputs.
pub async fn create_draft_slip(db: &DatabaseConnection, new: NewSlip) -> Result<pay_slip::Model> {
    let NewSlip {
        employee_id,
        month,
        year,
        worked_days,
        standard_days,
        overtime_hours,
        bonuses,
        allowances,
        benefits_in_kind,
        misc_deductions,
        created_by,
    } = new;
    if !(1..=12).contains(&month) {
        return Err(Error::Configuration {
            message: format!("month must be between 1 and 12, got {month}"),
        });
    }
    let employee = get_employee(db, employee_id).await?;
    if !employee.is_active {
        return Err(Error::Configuration {
            message: format!("employee {} is not active", employee.id),
        });
    }
    line_items::validate_inputs(&SlipInputs {
        base_salary: employee.base_salary,
        worked_days,
        standard_days,
        overtime_hours,
        bonuses,
        allowances,
        benefits_in_kind,
        misc_deductions,
    })?;

    let existing = PaySlip::find()
        .filter(PaySlipColumn::EmployeeId.eq(employee_id))
        .filter(PaySlipColumn::Month.eq(month))
        .filter(PaySlipColumn::Year.eq(year))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateSlip {
            employee_id,
            month,
            year,
        });
    }

    let (period_start, period_end) = month_bounds(year, month)?;
    let slip_no = slip_number(year, month, &employee.last_name, employee.id);
    let now = Utc::now();

    let txn = db.begin().await?;
    let inserted = pay_slip::ActiveModel {
        employee_id: Set(employee_id),
        slip_no: Set(slip_no),
        month: Set(month),
        year: Set(year),
        period_start: Set(period_start),
        period_end: Set(period_end),
        worked_days: Set(worked_days),
        standard_days: Set(standard_days),
        overtime_hours: Set(overtime_hours),
        bonuses: Set(bonuses),
        allowances: Set(allowances),
        benefits_in_kind: Set(benefits_in_kind),
        misc_deductions: Set(misc_deductions),
        gross: Set(Decimal::ZERO),
        employee_contributions: Set(Decimal::ZERO),
        employer_contributions: Set(Decimal::ZERO),
        taxable_base: Set(Decimal::ZERO),
        tax: Set(Decimal::ZERO),
        net: Set(Decimal::ZERO),
        leave_accrual: Set(Decimal::ZERO),
        status: Set(SlipStatus::Draft),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    // Two concurrent creators race past the pre-check; the unique index
    // decides and the loser sees the same error as the pre-check.
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateSlip {
            employee_id,
            month,
            year,
        },
        _ => Error::Database(err),
    })?;

    record_history(
        &txn,
        inserted.id,
        SlipAction::Created,
        None,
        Some(SlipStatus::Draft),
        created_by,
        None,
    )
    .await?;
    txn.commit().await?;

    info!(
        slip_id = inserted.id,
        slip_no = %inserted.slip_no,
        employee_id = inserted.employee_id,
        "draft slip created"
    );
    Ok(inserted)
}

/// Recomputes a draft slip's line items and totals from its current inputs.
///
/// Within one transaction this deletes the slip's previous line items and
/// repayment rows, reopens any advance those rows had settled, reloads the
/// payroll parameters, contribution rules and due advances, runs the
/// builder, and persists the new rows and totals. Running it twice without
/// changing inputs persists the same figures and consumes no additional
/// advance balance.
///
/// # Errors
/// Returns `Error::InvalidTransition` unless the slip is a draft and
/// `Error::Configuration` when the payroll parameters are missing.
pub async fn calculate_slip(db: &DatabaseConnection, slip_id: i64) -> Result<pay_slip::Model> {
    let txn = db.begin().await?;

    let slip = PaySlip::find_by_id(slip_id)
        .one(&txn)
        .await?
        .ok_or(Error::SlipNotFound { id: slip_id })?;
    if slip.status != SlipStatus::Draft {
        return Err(Error::InvalidTransition {
            entity: "slip",
            from: slip.status.to_string(),
            attempted: "calculate",
        });
    }
    let employee = get_employee(&txn, slip.employee_id).await?;

    // Undo: drop this slip's previous output so advance balances derive
    // without it
    LineItem::delete_many()
        .filter(LineItemColumn::SlipId.eq(slip.id))
        .exec(&txn)
        .await?;
    let prior_repayments = Repayment::find()
        .filter(RepaymentColumn::SlipId.eq(slip.id))
        .all(&txn)
        .await?;
    let mut touched: Vec<i64> = prior_repayments.iter().map(|row| row.advance_id).collect();
    touched.sort_unstable();
    touched.dedup();
    Repayment::delete_many()
        .filter(RepaymentColumn::SlipId.eq(slip.id))
        .exec(&txn)
        .await?;

    // Reconcile: an advance this slip had settled is owed again
    for advance_id in touched {
        let adv = advance::get_advance(&txn, advance_id).await?;
        if adv.status == AdvanceStatus::Settled {
            let outstanding = advance::outstanding_balance(&txn, &adv).await?;
            if outstanding > SETTLEMENT_EPSILON {
                let mut model = adv.into_active_model();
                model.status = Set(AdvanceStatus::Disbursed);
                model.update(&txn).await?;
            }
        }
    }

    let pay_config = config::active_config(&txn).await?;
    let rules = contribution::active_rules(&txn).await?;
    let due = advance::due_advances(&txn, slip.employee_id).await?;
    let mut due_inputs = Vec::with_capacity(due.len());
    for (adv, outstanding) in &due {
        let installment_amount = adv.installment_amount.ok_or_else(|| Error::Configuration {
            message: format!("advance {} has no installment amount", adv.id),
        })?;
        due_inputs.push(DueAdvance {
            advance_id: adv.id,
            installment_amount,
            outstanding: *outstanding,
        });
    }

    let computed =
        build_line_items(&slip_inputs(&slip, &employee), &pay_config, &rules, &due_inputs)?;

    let mut display_order = 0;
    for item in &computed.items {
        display_order += 1;
        line_item::ActiveModel {
            slip_id: Set(slip.id),
            code: Set(item.code.clone()),
            label: Set(item.label.clone()),
            category: Set(item.category),
            kind: Set(item.kind),
            base: Set(item.base),
            rate: Set(item.rate),
            quantity: Set(item.quantity),
            amount: Set(item.amount),
            employee_share: Set(item.employee_share),
            employer_share: Set(item.employer_share),
            display_order: Set(display_order),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let today = Utc::now().date_naive();
    for computed_repayment in &computed.repayments {
        let prior = Repayment::find()
            .filter(RepaymentColumn::AdvanceId.eq(computed_repayment.advance_id))
            .count(&txn)
            .await?;
        // Repayment counts stay tiny, the cast cannot truncate in practice
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let installment_no = prior as i32 + 1;
        repayment::ActiveModel {
            advance_id: Set(computed_repayment.advance_id),
            slip_id: Set(slip.id),
            amount: Set(computed_repayment.amount),
            installment_no: Set(installment_no),
            recorded_on: Set(today),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let adv = advance::get_advance(&txn, computed_repayment.advance_id).await?;
        let outstanding = advance::outstanding_balance(&txn, &adv).await?;
        if outstanding <= SETTLEMENT_EPSILON && adv.status != AdvanceStatus::Settled {
            let mut model = adv.into_active_model();
            model.status = Set(AdvanceStatus::Settled);
            model.update(&txn).await?;
            info!(advance_id = computed_repayment.advance_id, "advance settled");
        }
    }

    let mut model = slip.into_active_model();
    model.gross = Set(computed.gross);
    model.employee_contributions = Set(computed.employee_contributions);
    model.employer_contributions = Set(computed.employer_contributions);
    model.taxable_base = Set(computed.taxable_base);
    model.tax = Set(computed.tax);
    model.net = Set(computed.net);
    model.leave_accrual = Set(computed.leave_accrual);
    model.updated_at = Set(Utc::now());
    let updated = model.update(&txn).await?;

    record_history(&txn, slip_id, SlipAction::Calculated, None, None, None, None).await?;
    txn.commit().await?;

    info!(
        slip_id = updated.id,
        gross = %updated.gross,
        net = %updated.net,
        "slip calculated"
    );
    Ok(updated)
}

/// Changes a draft slip's inputs. Totals go stale until the next
/// [`calculate_slip`]; the caller decides when to recompute.
pub async fn update_slip_inputs(
    db: &DatabaseConnection,
    slip_id: i64,
    patch: SlipInputsPatch,
) -> Result<pay_slip::Model> {
    let SlipInputsPatch {
        worked_days,
        standard_days,
        overtime_hours,
        bonuses,
        allowances,
        benefits_in_kind,
        misc_deductions,
    } = patch;
    if let Some(days) = standard_days {
        if days < 1 {
            return Err(Error::Configuration {
                message: format!("standard days must be at least 1, got {days}"),
            });
        }
    }
    for value in [
        worked_days,
        overtime_hours,
        bonuses,
        allowances,
        benefits_in_kind,
        misc_deductions,
    ]
    .into_iter()
    .flatten()
    {
        if value < Decimal::ZERO {
            return Err(Error::InvalidAmount { amount: value });
        }
    }

    let slip = get_slip_model(db, slip_id).await?;
    if slip.status != SlipStatus::Draft {
        return Err(Error::InvalidTransition {
            entity: "slip",
            from: slip.status.to_string(),
            attempted: "update inputs",
        });
    }

    let txn = db.begin().await?;
    let mut model = slip.into_active_model();
    if let Some(value) = worked_days {
        model.worked_days = Set(value);
    }
    if let Some(value) = standard_days {
        model.standard_days = Set(value);
    }
    if let Some(value) = overtime_hours {
        model.overtime_hours = Set(value);
    }
    if let Some(value) = bonuses {
        model.bonuses = Set(value);
    }
    if let Some(value) = allowances {
        model.allowances = Set(value);
    }
    if let Some(value) = benefits_in_kind {
        model.benefits_in_kind = Set(value);
    }
    if let Some(value) = misc_deductions {
        model.misc_deductions = Set(value);
    }
    model.updated_at = Set(Utc::now());
    let updated = model.update(&txn).await?;
    record_history(&txn, slip_id, SlipAction::InputsUpdated, None, None, None, None).await?;
    txn.commit().await?;

    info!(slip_id = updated.id, "slip inputs updated");
    Ok(updated)
}

/// Freezes a draft slip after review and notifies the employee.
///
/// The notification is fire-and-forget: a notifier failure is logged and
/// never rolls back the validation.
pub async fn validate_slip(
    db: &DatabaseConnection,
    slip_id: i64,
    validator_id: i64,
    notifier: &dyn SlipNotifier,
) -> Result<pay_slip::Model> {
    let slip = get_slip_model(db, slip_id).await?;
    if slip.status != SlipStatus::Draft {
        return Err(Error::InvalidTransition {
            entity: "slip",
            from: slip.status.to_string(),
            attempted: "validate",
        });
    }

    let txn = db.begin().await?;
    let mut model = slip.into_active_model();
    model.status = Set(SlipStatus::Validated);
    model.validated_at = Set(Some(Utc::now()));
    model.validated_by = Set(Some(validator_id));
    model.updated_at = Set(Utc::now());
    let updated = model.update(&txn).await?;
    record_history(
        &txn,
        slip_id,
        SlipAction::Validated,
        Some(SlipStatus::Draft),
        Some(SlipStatus::Validated),
        Some(validator_id),
        None,
    )
    .await?;
    txn.commit().await?;

    info!(slip_id = updated.id, validator_id, "slip validated");
    if let Err(err) = notifier.slip_available(&updated) {
        warn!(slip_id = updated.id, error = %err, "slip notification failed");
    }
    Ok(updated)
}

/// Records the payout of a validated slip. Terminal: nothing may change a
/// paid slip afterwards.
pub async fn mark_slip_paid(
    db: &DatabaseConnection,
    slip_id: i64,
    paid_on: NaiveDate,
    method: PaymentMethod,
    reference: Option<String>,
) -> Result<pay_slip::Model> {
    let slip = get_slip_model(db, slip_id).await?;
    if slip.status != SlipStatus::Validated {
        return Err(Error::InvalidTransition {
            entity: "slip",
            from: slip.status.to_string(),
            attempted: "pay",
        });
    }

    let txn = db.begin().await?;
    let mut model = slip.into_active_model();
    model.status = Set(SlipStatus::Paid);
    model.paid_on = Set(Some(paid_on));
    model.payment_method = Set(Some(method));
    model.payment_reference = Set(reference.clone());
    model.updated_at = Set(Utc::now());
    let updated = model.update(&txn).await?;
    record_history(
        &txn,
        slip_id,
        SlipAction::Paid,
        Some(SlipStatus::Validated),
        Some(SlipStatus::Paid),
        None,
        reference,
    )
    .await?;
    txn.commit().await?;

    info!(slip_id = updated.id, paid_on = %paid_on, "slip marked paid");
    Ok(updated)
}

/// Fetches a slip together with its line items in display order.
pub async fn get_slip(
    db: &DatabaseConnection,
    slip_id: i64,
) -> Result<(pay_slip::Model, Vec<line_item::Model>)> {
    let slip = get_slip_model(db, slip_id).await?;
    let items = LineItem::find()
        .filter(LineItemColumn::SlipId.eq(slip_id))
        .order_by_asc(LineItemColumn::DisplayOrder)
        .all(db)
        .await?;
    Ok((slip, items))
}

/// Fetches the audit trail of a slip, oldest event first.
pub async fn get_slip_history(
    db: &DatabaseConnection,
    slip_id: i64,
) -> Result<Vec<slip_history::Model>> {
    get_slip_model(db, slip_id).await?;
    SlipHistory::find()
        .filter(SlipHistoryColumn::SlipId.eq(slip_id))
        .order_by_asc(SlipHistoryColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn get_slip_model<C: ConnectionTrait>(db: &C, id: i64) -> Result<pay_slip::Model> {
    PaySlip::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::SlipNotFound { id })
}

fn slip_inputs(slip: &pay_slip::Model, employee: &employee::Model) -> SlipInputs {
    SlipInputs {
        base_salary: employee.base_salary,
        worked_days: slip.worked_days,
        standard_days: slip.standard_days,
        overtime_hours: slip.overtime_hours,
        bonuses: slip.bonuses,
        allowances: slip.allowances,
        benefits_in_kind: slip.benefits_in_kind,
        misc_deductions: slip.misc_deductions,
    }
}

fn slip_number(year: i32, month: i32, last_name: &str, employee_id: i64) -> String {
    let prefix: String = last_name.chars().take(3).collect::<String>().to_uppercase();
    format!("PAY{year}{month:02}{prefix}{employee_id:03}")
}

fn month_bounds(year: i32, month: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = u32::try_from(month)
        .ok()
        .and_then(|m| NaiveDate::from_ymd_opt(year, m, 1))
        .ok_or_else(|| Error::Configuration {
            message: format!("invalid period {month}/{year}"),
        })?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| Error::Configuration {
            message: format!("invalid period {month}/{year}"),
        })?;
    Ok((start, end))
}

async fn record_history<C: ConnectionTrait>(
    db: &C,
    slip_id: i64,
    action: SlipAction,
    from_status: Option<SlipStatus>,
    to_status: Option<SlipStatus>,
    actor_id: Option<i64>,
    note: Option<String>,
) -> Result<()> {
    slip_history::ActiveModel {
        slip_id: Set(slip_id),
        action: Set(action),
        from_status: Set(from_status),
        to_status: Set(to_status),
        actor_id: Set(actor_id),
        note: Set(note),
        recorded_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::advance::{get_advance, outstanding_balance},
        entities::ItemCategory,
        test_utils::{
            FailingNotifier, RecordingNotifier, create_test_employee, draft_slip_for,
            granted_advance, setup_payroll, setup_test_db,
        },
    };
    use rust_decimal_macros::dec;

    #[test]
    fn test_slip_number_format() {
        assert_eq!(slip_number(2026, 3, "Mbarga", 7), "PAY202603MBA007");
        assert_eq!(slip_number(2026, 11, "Ng", 12), "PAY202611NG012");
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2026, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[tokio::test]
    async fn test_create_draft_slip() {
        let (db, employee) = setup_payroll().await.unwrap();

        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        assert_eq!(slip.slip_no, "PAY202603MBA001");
        assert_eq!(slip.status, SlipStatus::Draft);
        assert_eq!(slip.gross, Decimal::ZERO);
        assert_eq!(slip.net, Decimal::ZERO);
        assert_eq!(slip.period_start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(slip.period_end, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());

        let history = get_slip_history(&db, slip.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, SlipAction::Created);
        assert_eq!(history[0].to_status, Some(SlipStatus::Draft));
    }

    #[tokio::test]
    async fn test_duplicate_period_rejected() {
        let (db, employee) = setup_payroll().await.unwrap();
        draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let result = draft_slip_for(&db, employee.id, 3, 2026).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateSlip {
                month: 3,
                year: 2026,
                ..
            }
        ));

        // A different period is fine
        draft_slip_for(&db, employee.id, 4, 2026).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_bad_inputs() {
        let (db, employee) = setup_payroll().await.unwrap();

        let result = draft_slip_for(&db, employee.id, 13, 2026).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Configuration { message: _ }
        ));

        let result = draft_slip_for(&db, 99, 3, 2026).await;
        assert!(matches!(result.unwrap_err(), Error::EmployeeNotFound { id: 99 }));
    }

    #[tokio::test]
    async fn test_create_rejects_inactive_employee() {
        let (db, employee) = setup_payroll().await.unwrap();
        let mut model = employee.clone().into_active_model();
        model.is_active = Set(false);
        model.update(&db).await.unwrap();

        let result = draft_slip_for(&db, employee.id, 3, 2026).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Configuration { message: _ }
        ));
    }

    #[tokio::test]
    async fn test_calculate_reference_scenario() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let calculated = calculate_slip(&db, slip.id).await.unwrap();

        assert_eq!(calculated.gross, dec!(500000));
        assert_eq!(calculated.employee_contributions, dec!(21000));
        assert_eq!(calculated.employer_contributions, dec!(81000));
        assert_eq!(calculated.taxable_base, dec!(479000));
        assert_eq!(calculated.tax, dec!(36883));
        assert_eq!(calculated.net, dec!(442117));
        assert_eq!(calculated.leave_accrual, dec!(41650));
        // Calculation does not advance the lifecycle
        assert_eq!(calculated.status, SlipStatus::Draft);

        let (_, items) = get_slip(&db, slip.id).await.unwrap();
        let codes: Vec<&str> = items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["SAL_BASE", "CNPS_SAL", "IMPOT"]);
        let orders: Vec<i32> = items.iter().map(|i| i.display_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_calculate_unknown_slip() {
        let (db, _) = setup_payroll().await.unwrap();

        let result = calculate_slip(&db, 99).await;
        assert!(matches!(result.unwrap_err(), Error::SlipNotFound { id: 99 }));
    }

    #[tokio::test]
    async fn test_calculate_without_parameters_fails() {
        let db = setup_test_db().await.unwrap();
        let employee = create_test_employee(&db, "Mbarga").await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let result = calculate_slip(&db, slip.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Configuration { message: _ }
        ));
        // The failed run left nothing behind
        let (fetched, items) = get_slip(&db, slip.id).await.unwrap();
        assert_eq!(fetched.gross, Decimal::ZERO);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_recalculation_is_idempotent() {
        let (db, employee) = setup_payroll().await.unwrap();
        let advance = granted_advance(&db, employee.id, dec!(50000), 3).await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let first = calculate_slip(&db, slip.id).await.unwrap();
        let (_, first_items) = get_slip(&db, slip.id).await.unwrap();

        let second = calculate_slip(&db, slip.id).await.unwrap();
        let (_, second_items) = get_slip(&db, slip.id).await.unwrap();

        assert_eq!(first.gross, second.gross);
        assert_eq!(first.net, second.net);
        assert_eq!(first_items.len(), second_items.len());
        for (a, b) in first_items.iter().zip(&second_items) {
            assert_eq!(a.code, b.code);
            assert_eq!(a.amount, b.amount);
            assert_eq!(a.display_order, b.display_order);
        }

        // The second run consumed no extra balance and re-numbered from 1
        let adv = get_advance(&db, advance.id).await.unwrap();
        let outstanding = outstanding_balance(&db, &adv).await.unwrap();
        assert_eq!(outstanding, dec!(50000) - dec!(16666.67));

        let rows = Repayment::find()
            .filter(RepaymentColumn::AdvanceId.eq(advance.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].installment_no, 1);
    }

    #[tokio::test]
    async fn test_advance_settles_over_three_slips() {
        let (db, employee) = setup_payroll().await.unwrap();
        let advance = granted_advance(&db, employee.id, dec!(50000), 3).await.unwrap();

        let expected = [dec!(33333.33), dec!(16666.66), Decimal::ZERO];
        for (month, want) in (1..=3).zip(expected) {
            let slip = draft_slip_for(&db, employee.id, month, 2026).await.unwrap();
            calculate_slip(&db, slip.id).await.unwrap();

            let adv = get_advance(&db, advance.id).await.unwrap();
            let outstanding = outstanding_balance(&db, &adv).await.unwrap();
            assert_eq!(outstanding, want);
        }

        let adv = get_advance(&db, advance.id).await.unwrap();
        assert_eq!(adv.status, AdvanceStatus::Settled);

        // The fourth slip deducts nothing further
        let slip = draft_slip_for(&db, employee.id, 4, 2026).await.unwrap();
        let calculated = calculate_slip(&db, slip.id).await.unwrap();
        assert_eq!(calculated.net, dec!(442117));
        let (_, items) = get_slip(&db, slip.id).await.unwrap();
        assert!(
            items
                .iter()
                .all(|item| item.category != ItemCategory::AdvanceRepayment)
        );
    }

    #[tokio::test]
    async fn test_recalculation_reopens_settled_advance() {
        let (db, employee) = setup_payroll().await.unwrap();
        let advance = granted_advance(&db, employee.id, dec!(20000), 1).await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        calculate_slip(&db, slip.id).await.unwrap();
        let adv = get_advance(&db, advance.id).await.unwrap();
        assert_eq!(adv.status, AdvanceStatus::Settled);

        // Recalculating frees the balance mid-transaction, reopens the
        // advance, and collects it again: the end state is unchanged and the
        // deduction row is present exactly once.
        calculate_slip(&db, slip.id).await.unwrap();

        let adv = get_advance(&db, advance.id).await.unwrap();
        assert_eq!(adv.status, AdvanceStatus::Settled);
        assert_eq!(outstanding_balance(&db, &adv).await.unwrap(), Decimal::ZERO);
        let rows = Repayment::find()
            .filter(RepaymentColumn::AdvanceId.eq(advance.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, dec!(20000));
    }

    #[tokio::test]
    async fn test_update_inputs_marks_totals_stale() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();
        calculate_slip(&db, slip.id).await.unwrap();

        let patch = SlipInputsPatch {
            bonuses: Some(dec!(30000)),
            ..SlipInputsPatch::default()
        };
        let updated = update_slip_inputs(&db, slip.id, patch).await.unwrap();

        assert_eq!(updated.bonuses, dec!(30000));
        // Totals keep the previous calculation until the caller recomputes
        assert_eq!(updated.gross, dec!(500000));

        let recalculated = calculate_slip(&db, slip.id).await.unwrap();
        assert_eq!(recalculated.gross, dec!(530000));

        let history = get_slip_history(&db, slip.id).await.unwrap();
        let actions: Vec<SlipAction> = history.iter().map(|row| row.action).collect();
        assert_eq!(
            actions,
            vec![
                SlipAction::Created,
                SlipAction::Calculated,
                SlipAction::InputsUpdated,
                SlipAction::Calculated,
            ]
        );
    }

    #[tokio::test]
    async fn test_update_inputs_validates() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let patch = SlipInputsPatch {
            worked_days: Some(dec!(-1)),
            ..SlipInputsPatch::default()
        };
        assert!(matches!(
            update_slip_inputs(&db, slip.id, patch).await.unwrap_err(),
            Error::InvalidAmount { .. }
        ));

        let patch = SlipInputsPatch {
            standard_days: Some(0),
            ..SlipInputsPatch::default()
        };
        assert!(matches!(
            update_slip_inputs(&db, slip.id, patch).await.unwrap_err(),
            Error::Configuration { message: _ }
        ));
    }

    #[tokio::test]
    async fn test_validate_slip_notifies() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();
        calculate_slip(&db, slip.id).await.unwrap();

        let notifier = RecordingNotifier::default();
        let validated = validate_slip(&db, slip.id, 9, &notifier).await.unwrap();

        assert_eq!(validated.status, SlipStatus::Validated);
        assert_eq!(validated.validated_by, Some(9));
        assert!(validated.validated_at.is_some());
        assert_eq!(notifier.notified(), vec![slip.id]);

        let history = get_slip_history(&db, slip.id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.action, SlipAction::Validated);
        assert_eq!(last.from_status, Some(SlipStatus::Draft));
        assert_eq!(last.to_status, Some(SlipStatus::Validated));
        assert_eq!(last.actor_id, Some(9));
    }

    #[tokio::test]
    async fn test_validate_twice_rejected() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();
        let notifier = RecordingNotifier::default();
        validate_slip(&db, slip.id, 9, &notifier).await.unwrap();

        let result = validate_slip(&db, slip.id, 9, &notifier).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition {
                entity: "slip",
                attempted: "validate",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_validate_survives_notifier_failure() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let validated = validate_slip(&db, slip.id, 9, &FailingNotifier).await.unwrap();
        assert_eq!(validated.status, SlipStatus::Validated);
    }

    #[tokio::test]
    async fn test_mark_paid_records_payment() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();
        calculate_slip(&db, slip.id).await.unwrap();
        validate_slip(&db, slip.id, 9, &RecordingNotifier::default()).await.unwrap();

        let paid_on = NaiveDate::from_ymd_opt(2026, 3, 28).unwrap();
        let paid = mark_slip_paid(
            &db,
            slip.id,
            paid_on,
            PaymentMethod::BankTransfer,
            Some("TRF-2026-031".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(paid.status, SlipStatus::Paid);
        assert_eq!(paid.paid_on, Some(paid_on));
        assert_eq!(paid.payment_method, Some(PaymentMethod::BankTransfer));
        assert_eq!(paid.payment_reference, Some("TRF-2026-031".to_string()));

        let history = get_slip_history(&db, slip.id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.action, SlipAction::Paid);
        assert_eq!(last.note, Some("TRF-2026-031".to_string()));
    }

    #[tokio::test]
    async fn test_mark_paid_requires_validated() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();

        let result = mark_slip_paid(
            &db,
            slip.id,
            NaiveDate::from_ymd_opt(2026, 3, 28).unwrap(),
            PaymentMethod::Cash,
            None,
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition {
                entity: "slip",
                attempted: "pay",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_paid_slip_is_terminal() {
        let (db, employee) = setup_payroll().await.unwrap();
        let slip = draft_slip_for(&db, employee.id, 3, 2026).await.unwrap();
        calculate_slip(&db, slip.id).await.unwrap();
        validate_slip(&db, slip.id, 9, &RecordingNotifier::default()).await.unwrap();
        mark_slip_paid(
            &db,
            slip.id,
            NaiveDate::from_ymd_opt(2026, 3, 28).unwrap(),
            PaymentMethod::Cash,
            None,
        )
        .await
        .unwrap();

        assert!(matches!(
            calculate_slip(&db, slip.id).await.unwrap_err(),
            Error::InvalidTransition { from, .. } if from == "paid"
        ));
        assert!(matches!(
            update_slip_inputs(&db, slip.id, SlipInputsPatch::default())
                .await
                .unwrap_err(),
            Error::InvalidTransition { from, .. } if from == "paid"
        ));
        assert!(matches!(
            validate_slip(&db, slip.id, 9, &RecordingNotifier::default())
                .await
                .unwrap_err(),
            Error::InvalidTransition { from, .. } if from == "paid"
        ));
        assert!(matches!(
            mark_slip_paid(
                &db,
                slip.id,
                NaiveDate::from_ymd_opt(2026, 3, 29).unwrap(),
                PaymentMethod::Cash,
                None,
            )
            .await
            .unwrap_err(),
            Error::InvalidTransition { from, .. } if from == "paid"
        ));
    }

    #[tokio::test]
    async fn test_get_slip_history_requires_slip() {
        let (db, _) = setup_payroll().await.unwrap();

        let result = get_slip_history(&db, 99).await;
        assert!(matches!(result.unwrap_err(), Error::SlipNotFound { id: 99 }));
    }
}
