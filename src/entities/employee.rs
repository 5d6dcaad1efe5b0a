//! Employee entity - the people payroll is computed for.
//!
//! The engine reads employees; it does not own HR management. Only the
//! fields the calculation and slip numbering need are modeled here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Employee database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    /// Unique identifier for the employee
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Employer-assigned staff number, unique across the registry
    #[sea_orm(unique)]
    pub staff_no: String,
    /// Family name; its first letters feed the slip number
    pub last_name: String,
    /// Given name
    pub first_name: String,
    /// Contact address for slip notifications, if any
    pub email: Option<String>,
    /// Contractual monthly base salary, never negative
    pub base_salary: Decimal,
    /// Inactive employees are excluded from new payroll runs
    pub is_active: bool,
    /// When the employee was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Employee and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One employee has many pay slips
    #[sea_orm(has_many = "super::pay_slip::Entity")]
    PaySlips,
    /// One employee has many salary advances
    #[sea_orm(has_many = "super::advance::Entity")]
    Advances,
}

impl Related<super::pay_slip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaySlips.def()
    }
}

impl Related<super::advance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
