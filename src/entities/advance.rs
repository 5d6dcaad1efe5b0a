//! Salary advance entity.
//!
//! The outstanding balance of an advance is never stored. It is derived as
//! `granted_amount` minus the sum of the repayment rows referencing the
//! advance, so recalculating a slip can never double-deduct.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a salary advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStatus {
    /// Asked for, not yet decided on
    #[sea_orm(string_value = "requested")]
    Requested,
    /// Approved with a granted amount and an installment plan
    #[sea_orm(string_value = "granted")]
    Granted,
    /// Money handed over; repayment runs through pay slips
    #[sea_orm(string_value = "disbursed")]
    Disbursed,
    /// Fully repaid (outstanding balance within the settlement epsilon)
    #[sea_orm(string_value = "settled")]
    Settled,
}

impl std::fmt::Display for AdvanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Requested => "requested",
            Self::Granted => "granted",
            Self::Disbursed => "disbursed",
            Self::Settled => "settled",
        };
        f.write_str(label)
    }
}

/// Salary advance database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "advances")]
pub struct Model {
    /// Unique identifier for the advance
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Employee the advance belongs to
    pub employee_id: i64,
    /// Amount originally asked for, strictly positive
    pub requested_amount: Decimal,
    /// Amount actually approved; set when the advance is granted
    pub granted_amount: Option<Decimal>,
    /// Free-form justification given by the employee
    pub reason: Option<String>,
    /// Number of monthly installments the repayment is spread over, >= 1
    pub installments: i32,
    /// Per-installment repayment, `granted_amount / installments` rounded
    /// to two decimals at grant time
    pub installment_amount: Option<Decimal>,
    /// Where the advance is in its lifecycle
    pub status: AdvanceStatus,
    /// When the employee asked
    pub requested_on: Date,
    /// When the advance was approved
    pub granted_on: Option<Date>,
    /// When the money was handed over
    pub disbursed_on: Option<Date>,
    /// Administrator who approved the advance
    pub approved_by: Option<i64>,
}

/// Defines relationships between advances and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each advance belongs to one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    /// One advance accumulates many repayment rows
    #[sea_orm(has_many = "super::repayment::Entity")]
    Repayments,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::repayment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
