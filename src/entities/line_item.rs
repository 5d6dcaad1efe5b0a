//! Line item entity - one itemized gain or deduction row of a pay slip.
//!
//! Line items exist only as part of their slip and are deleted en masse when
//! the slip is recalculated. `display_order` is the position in the fixed
//! append sequence of the builder, not a separately managed counter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What part of the calculation a line item comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Pro-rated base salary or overtime pay
    #[sea_orm(string_value = "salary")]
    Salary,
    /// Bonus payments
    #[sea_orm(string_value = "bonus")]
    Bonus,
    /// Allowances
    #[sea_orm(string_value = "allowance")]
    Allowance,
    /// Benefits in kind
    #[sea_orm(string_value = "benefit")]
    Benefit,
    /// Employee share of a social contribution
    #[sea_orm(string_value = "contribution")]
    Contribution,
    /// Income tax
    #[sea_orm(string_value = "tax")]
    Tax,
    /// Repayment installment of a salary advance
    #[sea_orm(string_value = "advance_repayment")]
    AdvanceRepayment,
    /// Anything else, e.g. miscellaneous deductions
    #[sea_orm(string_value = "other")]
    Other,
}

/// Whether a line item adds to or subtracts from the slip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Counts toward gross
    #[sea_orm(string_value = "gain")]
    Gain,
    /// Deducted on the way from gross to net
    #[sea_orm(string_value = "deduction")]
    Deduction,
}

/// Line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Slip this item belongs to
    pub slip_id: i64,
    /// Short mnemonic (e.g. `"SAL_BASE"`, `"CNPS_SAL"`)
    pub code: String,
    /// Human-readable label shown on the slip
    pub label: String,
    /// Which step of the calculation produced the item
    pub category: ItemCategory,
    /// Gain or deduction
    pub kind: ItemKind,
    /// Monetary base a rate was applied to, where meaningful
    pub base: Option<Decimal>,
    /// Rate in percentage points, where meaningful
    pub rate: Option<Decimal>,
    /// Quantity (days, hours), where meaningful
    pub quantity: Option<Decimal>,
    /// The item's monetary effect, always non-negative; `kind` carries
    /// the sign
    pub amount: Decimal,
    /// Employee share for contribution items
    pub employee_share: Option<Decimal>,
    /// Employer share for contribution items
    pub employer_share: Option<Decimal>,
    /// Position of the item in the slip's breakdown
    pub display_order: i32,
}

/// Defines relationships between line items and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line item belongs to one pay slip
    #[sea_orm(
        belongs_to = "super::pay_slip::Entity",
        from = "Column::SlipId",
        to = "super::pay_slip::Column::Id"
    )]
    PaySlip,
}

impl Related<super::pay_slip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaySlip.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
