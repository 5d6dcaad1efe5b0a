//! Advance repayment ledger entity.
//!
//! One row per repayment deducted on a pay slip. Rows are owned by the slip
//! that produced them: recalculation deletes and re-creates them, which is
//! what makes advance balances derived rather than mutated in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Advance repayment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "advance_repayments")]
pub struct Model {
    /// Unique identifier for the repayment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Advance being repaid
    pub advance_id: i64,
    /// Slip that carried the deduction
    pub slip_id: i64,
    /// Amount repaid, strictly positive
    pub amount: Decimal,
    /// 1-based ordinal among the advance's surviving repayments
    pub installment_no: i32,
    /// When the repayment was recorded
    pub recorded_on: Date,
}

/// Defines relationships between repayments and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each repayment belongs to one advance
    #[sea_orm(
        belongs_to = "super::advance::Entity",
        from = "Column::AdvanceId",
        to = "super::advance::Column::Id"
    )]
    Advance,
    /// Each repayment was deducted on one pay slip
    #[sea_orm(
        belongs_to = "super::pay_slip::Entity",
        from = "Column::SlipId",
        to = "super::pay_slip::Column::Id"
    )]
    PaySlip,
}

impl Related<super::advance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advance.def()
    }
}

impl Related<super::pay_slip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaySlip.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
