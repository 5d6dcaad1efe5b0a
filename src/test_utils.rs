//! Shared test utilities for the payroll engine.
//!
//! This module provides common helper functions for setting up test
//! databases and creating payroll fixtures with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        advance::{self, NewAdvance},
        contribution::{self, NewRule},
        employee::{self, NewEmployee},
        slip::{self, NewSlip},
    },
    entities::{self, ContributionBase},
    errors::{Error, Result},
    notify::SlipNotifier,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test employee with sensible defaults.
///
/// # Arguments
/// * `db` - Database connection
/// * `last_name` - Family name, also drives the staff number
///
/// # Defaults
/// * `staff_no`: `"EMP-{LAST_NAME}"`
/// * `first_name`: `"Test"`
/// * `email`: None
/// * `base_salary`: 500,000
pub async fn create_test_employee(
    db: &DatabaseConnection,
    last_name: &str,
) -> Result<entities::employee::Model> {
    employee::create_employee(
        db,
        NewEmployee {
            staff_no: format!("EMP-{}", last_name.to_uppercase()),
            last_name: last_name.to_string(),
            first_name: "Test".to_string(),
            email: None,
            base_salary: dec!(500000),
        },
    )
    .await
}

/// Inserts the payroll parameter row directly.
///
/// # Defaults
/// * `weekly_hours`: 40, `overtime_rate25`: 25, `overtime_rate50`: 50
/// * `tax_rate`: 11, `professional_deduction_rate`: 30
/// * `leave_accrual_rate`: 8.33, `payment_day`: 30
pub async fn insert_test_config(db: &DatabaseConnection) -> Result<entities::pay_config::Model> {
    entities::pay_config::ActiveModel {
        weekly_hours: Set(dec!(40)),
        overtime_rate25: Set(dec!(25)),
        overtime_rate50: Set(dec!(50)),
        tax_rate: Set(dec!(11)),
        professional_deduction_rate: Set(dec!(30)),
        leave_accrual_rate: Set(dec!(8.33)),
        payment_day: Set(30),
        updated_at: Set(Utc::now()),
        updated_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an active contribution rule on the gross base with no cap,
/// floor or ceiling.
pub async fn create_test_rule(
    db: &DatabaseConnection,
    code: &str,
    employee_rate: Decimal,
    employer_rate: Decimal,
) -> Result<entities::contribution::Model> {
    contribution::create_rule(
        db,
        NewRule {
            code: code.to_string(),
            label: format!("{code} contribution"),
            employee_rate,
            employer_rate,
            base: ContributionBase::Gross,
            cap: None,
            floor: None,
            ceiling: None,
            display_order: 0,
        },
    )
    .await
}

/// Opens a draft slip with a full month of attendance (22 of 22 days) and
/// no variable pay.
pub async fn draft_slip_for(
    db: &DatabaseConnection,
    employee_id: i64,
    month: i32,
    year: i32,
) -> Result<entities::pay_slip::Model> {
    slip::create_draft_slip(
        db,
        NewSlip {
            employee_id,
            month,
            year,
            worked_days: dec!(22),
            standard_days: 22,
            overtime_hours: Decimal::ZERO,
            bonuses: Decimal::ZERO,
            allowances: Decimal::ZERO,
            benefits_in_kind: Decimal::ZERO,
            misc_deductions: Decimal::ZERO,
            created_by: None,
        },
    )
    .await
}

/// Requests, grants and disburses an advance in one go, granted at the
/// requested amount.
pub async fn granted_advance(
    db: &DatabaseConnection,
    employee_id: i64,
    amount: Decimal,
    installments: i32,
) -> Result<entities::advance::Model> {
    let requested = advance::request_advance(
        db,
        NewAdvance {
            employee_id,
            amount,
            installments,
            reason: None,
        },
    )
    .await?;
    advance::grant_advance(db, requested.id, amount, None, Utc::now().date_naive()).await?;
    advance::disburse_advance(db, requested.id, Utc::now().date_naive()).await
}

/// Sets up a complete payroll environment: schema, parameters, a pension
/// rule (4.2% employee, 16.2% employer, gross base) and one active
/// employee. Returns (db, employee) for calculation tests.
pub async fn setup_payroll() -> Result<(DatabaseConnection, entities::employee::Model)> {
    let db = setup_test_db().await?;
    insert_test_config(&db).await?;
    create_test_rule(&db, "CNPS", dec!(4.2), dec!(16.2)).await?;
    let employee = create_test_employee(&db, "Mbarga").await?;
    Ok((db, employee))
}

/// Notifier double that records the slips it was told about.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notified: Mutex<Vec<i64>>,
}

impl RecordingNotifier {
    /// The slip ids passed to the notifier, in call order.
    pub fn notified(&self) -> Vec<i64> {
        self.notified.lock().unwrap().clone()
    }
}

impl SlipNotifier for RecordingNotifier {
    fn slip_available(&self, slip: &entities::pay_slip::Model) -> Result<()> {
        self.notified.lock().unwrap().push(slip.id);
        Ok(())
    }
}

/// Notifier double that always fails, for exercising the swallow path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingNotifier;

impl SlipNotifier for FailingNotifier {
    fn slip_available(&self, _slip: &entities::pay_slip::Model) -> Result<()> {
        Err(Error::Configuration {
            message: "notifier wired to fail".to_string(),
        })
    }
}
