//! Contribution rule entity - configurable social contributions.
//!
//! Each rule splits into an employee share (deducted from net) and an
//! employer share (tracked for totals only). Only active rules participate
//! in a calculation, iterated in display order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a contribution rate is applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ContributionBase {
    /// The full gross of the slip
    #[sea_orm(string_value = "gross")]
    Gross,
    /// Gross clamped to the rule's cap
    #[sea_orm(string_value = "capped_gross")]
    CappedGross,
    /// A base the engine does not derive itself; such rules are stored but
    /// take no part in the automatic calculation
    #[sea_orm(string_value = "other")]
    Other,
}

/// Contribution rule database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contribution_rules")]
pub struct Model {
    /// Unique identifier for the rule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short mnemonic, unique (e.g. `"CNPS"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Human-readable name shown on slips
    pub label: String,
    /// Employee share rate in percentage points, 0-100
    pub employee_rate: Decimal,
    /// Employer share rate in percentage points, 0-100
    pub employer_rate: Decimal,
    /// What the rates are applied to
    pub base: ContributionBase,
    /// Upper bound on the base when `base` is `CappedGross`
    pub cap: Option<Decimal>,
    /// Absolute minimum for each computed share, if any
    pub floor: Option<Decimal>,
    /// Absolute maximum for each computed share, if any
    pub ceiling: Option<Decimal>,
    /// Inactive rules are kept for history but skipped in calculations
    pub active: bool,
    /// Position of the rule among the contribution line items
    pub display_order: i32,
    /// When the rule was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between contribution rules and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
