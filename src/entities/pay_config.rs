//! Payroll configuration entity - a single row of company-wide parameters.
//!
//! Every calculation reads the row active at calculation time and threads it
//! through the line item builder explicitly. Rates are stored as percentage
//! points (a `tax_rate` of 11 means 11%).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payroll parameters database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pay_config")]
pub struct Model {
    /// Unique identifier; the table holds a single row in practice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Standard contractual hours per week, strictly positive
    pub weekly_hours: Decimal,
    /// Premium for the first overtime tier, in percentage points
    pub overtime_rate25: Decimal,
    /// Premium for the second overtime tier, in percentage points
    pub overtime_rate50: Decimal,
    /// Income tax rate applied after the professional deduction, 0-100
    pub tax_rate: Decimal,
    /// Professional deduction rate subtracted from the taxable base, 0-100
    pub professional_deduction_rate: Decimal,
    /// Share of gross accrued as paid-leave provision each period
    pub leave_accrual_rate: Decimal,
    /// Day of the month salaries are paid out, 1-31
    pub payment_day: i32,
    /// When the parameters were last changed
    pub updated_at: DateTimeUtc,
    /// Administrator who last changed them, if known
    pub updated_by: Option<i64>,
}

/// Defines relationships between the configuration and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
