//! Slip history entity - append-only audit trail of slip lifecycle events.
//!
//! Every lifecycle operation writes one row inside the same transaction as
//! the change it records, so the trail never disagrees with the slip.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::pay_slip::SlipStatus;

/// What happened to a slip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SlipAction {
    /// Draft slip created
    #[sea_orm(string_value = "created")]
    Created,
    /// Worked time or variable inputs changed
    #[sea_orm(string_value = "inputs_updated")]
    InputsUpdated,
    /// Line items and totals recomputed
    #[sea_orm(string_value = "calculated")]
    Calculated,
    /// Slip validated and frozen
    #[sea_orm(string_value = "validated")]
    Validated,
    /// Slip paid out
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// Slip history database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "slip_history")]
pub struct Model {
    /// Unique identifier for the history row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Slip the event concerns
    pub slip_id: i64,
    /// What happened
    pub action: SlipAction,
    /// Status before the event, where the event changed it
    pub from_status: Option<SlipStatus>,
    /// Status after the event, where the event changed it
    pub to_status: Option<SlipStatus>,
    /// Who triggered the event, if known
    pub actor_id: Option<i64>,
    /// Free-form detail, e.g. the payment reference
    pub note: Option<String>,
    /// When the event happened
    pub recorded_at: DateTimeUtc,
}

/// Defines relationships between history rows and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each history row belongs to one pay slip
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
