//! Pay slip entity - one slip per employee and period.
//!
//! A slip holds the caller-supplied inputs and the computed totals side by
//! side. Totals are zero until the first calculation runs. The slip owns its
//! line items and repayment rows exclusively; both are replaced as a whole
//! on recalculation. Uniqueness of (`employee_id`, `month`, `year`) is
//! enforced by a dedicated index created with the schema.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a pay slip, strictly linear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SlipStatus {
    /// Inputs mutable, may be recalculated any number of times
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Checked by a validator; inputs and totals frozen
    #[sea_orm(string_value = "validated")]
    Validated,
    /// Paid out; terminal, no further mutation of any kind
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl SlipStatus {
    /// Whether the slip admits no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl std::fmt::Display for SlipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Validated => "validated",
            Self::Paid => "paid",
        };
        f.write_str(label)
    }
}

/// How a slip was paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Wire to the employee's bank account
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// Cash over the counter
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Paper cheque
    #[sea_orm(string_value = "cheque")]
    Cheque,
}

/// Pay slip database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pay_slips")]
pub struct Model {
    /// Unique identifier for the slip
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Employee the slip belongs to
    pub employee_id: i64,
    /// Human-facing slip reference, unique (`PAY{year}{month}{prefix}{id}`)
    #[sea_orm(unique)]
    pub slip_no: String,
    /// Period month, 1-12
    pub month: i32,
    /// Period year
    pub year: i32,
    /// First calendar day of the period
    pub period_start: Date,
    /// Last calendar day of the period
    pub period_end: Date,
    /// Days actually worked, may be fractional
    pub worked_days: Decimal,
    /// Working days in the period, the pro-rata denominator
    pub standard_days: i32,
    /// Overtime hours worked
    pub overtime_hours: Decimal,
    /// Bonus amount for the period
    pub bonuses: Decimal,
    /// Allowances for the period
    pub allowances: Decimal,
    /// Benefits in kind valued for the period
    pub benefits_in_kind: Decimal,
    /// Miscellaneous deductions for the period
    pub misc_deductions: Decimal,
    /// Sum of all gain line items
    pub gross: Decimal,
    /// Total employee-side contributions deducted from net
    pub employee_contributions: Decimal,
    /// Total employer-side contributions, tracked but not deducted
    pub employer_contributions: Decimal,
    /// Gross minus employee contributions, floored at zero
    pub taxable_base: Decimal,
    /// Income tax deducted
    pub tax: Decimal,
    /// What the employee takes home
    pub net: Decimal,
    /// Paid-leave provision accrued this period (aggregate only)
    pub leave_accrual: Decimal,
    /// Where the slip is in its lifecycle
    pub status: SlipStatus,
    /// When the slip was validated
    pub validated_at: Option<DateTimeUtc>,
    /// Who validated it
    pub validated_by: Option<i64>,
    /// When the slip was paid out
    pub paid_on: Option<Date>,
    /// How it was paid out
    pub payment_method: Option<PaymentMethod>,
    /// Bank or cheque reference of the payment
    pub payment_reference: Option<String>,
    /// Who created the draft
    pub created_by: Option<i64>,
    /// When the draft was created
    pub created_at: DateTimeUtc,
    /// When the slip last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between pay slips and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each slip belongs to one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    /// One slip owns many line items
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
    /// One slip may carry several advance repayments
    #[sea_orm(has_many = "super::repayment::Entity")]
    Repayments,
    /// One slip accumulates audit history rows
    #[sea_orm(has_many = "super::slip_history::Entity")]
    History,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::repayment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repayments.def()
    }
}

impl Related<super::slip_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
