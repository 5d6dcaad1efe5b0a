//! Contribution rule administration.
//!
//! Rules are data, not code: adding a contribution scheme or retiring one
//! is a row change, never a release. Deactivated rules stay in place so
//! line items on historical slips keep pointing at a definition.

use crate::{
    entities::{Contribution, ContributionBase, ContributionColumn, contribution},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
};
use tracing::info;

/// A contribution rule to register.
#[derive(Debug, Clone)]
pub struct NewRule {
    /// Unique short code (e.g. `"CNPS"`)
    pub code: String,
    /// Human-readable name
    pub label: String,
    /// Employee share rate in percent
    pub employee_rate: Decimal,
    /// Employer share rate in percent
    pub employer_rate: Decimal,
    /// Which base the rates apply to
    pub base: ContributionBase,
    /// Cap on the base, required for a capped base
    pub cap: Option<Decimal>,
    /// Minimum per-share amount once a rate applies
    pub floor: Option<Decimal>,
    /// Maximum per-share amount
    pub ceiling: Option<Decimal>,
    /// Position in the deduction sequence
    pub display_order: i32,
}

/// Replacement values for an existing rule. The code itself never changes;
/// line items on issued slips reference it.
#[derive(Debug, Clone)]
pub struct RuleUpdate {
    /// Human-readable name
    pub label: String,
    /// Employee share rate in percent
    pub employee_rate: Decimal,
    /// Employer share rate in percent
    pub employer_rate: Decimal,
    /// Which base the rates apply to
    pub base: ContributionBase,
    /// Cap on the base, required for a capped base
    pub cap: Option<Decimal>,
    /// Minimum per-share amount once a rate applies
    pub floor: Option<Decimal>,
    /// Maximum per-share amount
    pub ceiling: Option<Decimal>,
    /// Position in the deduction sequence
    pub display_order: i32,
}

/// Registers a new contribution rule.
///
/// # Errors
/// Returns `Error::Configuration` for invalid rates or an already-used
/// code.
pub async fn create_rule(db: &DatabaseConnection, rule: NewRule) -> Result<contribution::Model> {
    let code = rule.code.trim().to_string();
    if code.is_empty() {
        return Err(Error::Configuration {
            message: "contribution rule code cannot be empty".to_string(),
        });
    }
    validate_rule_fields(
        &code,
        &rule.label,
        rule.employee_rate,
        rule.employer_rate,
        rule.base,
        rule.cap,
        rule.floor,
        rule.ceiling,
    )?;

    let existing = Contribution::find()
        .filter(ContributionColumn::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Configuration {
            message: format!("contribution rule '{code}' already exists"),
        });
    }

    let created = contribution::ActiveModel {
        code: Set(code.clone()),
        label: Set(rule.label),
        employee_rate: Set(rule.employee_rate),
        employer_rate: Set(rule.employer_rate),
        base: Set(rule.base),
        cap: Set(rule.cap),
        floor: Set(rule.floor),
        ceiling: Set(rule.ceiling),
        active: Set(true),
        display_order: Set(rule.display_order),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(code = %created.code, "contribution rule created");
    Ok(created)
}

/// Replaces the mutable fields of a rule, identified by code.
pub async fn update_rule(
    db: &DatabaseConnection,
    code: &str,
    update: RuleUpdate,
) -> Result<contribution::Model> {
    validate_rule_fields(
        code,
        &update.label,
        update.employee_rate,
        update.employer_rate,
        update.base,
        update.cap,
        update.floor,
        update.ceiling,
    )?;

    let mut model = rule_by_code(db, code).await?.into_active_model();
    model.label = Set(update.label);
    model.employee_rate = Set(update.employee_rate);
    model.employer_rate = Set(update.employer_rate);
    model.base = Set(update.base);
    model.cap = Set(update.cap);
    model.floor = Set(update.floor);
    model.ceiling = Set(update.ceiling);
    model.display_order = Set(update.display_order);

    let updated = model.update(db).await?;
    info!(code = %updated.code, "contribution rule updated");
    Ok(updated)
}

/// Takes a rule out of every future calculation. Historical slips keep
/// their persisted items.
pub async fn deactivate_rule(db: &DatabaseConnection, code: &str) -> Result<contribution::Model> {
    let mut model = rule_by_code(db, code).await?.into_active_model();
    model.active = Set(false);

    let updated = model.update(db).await?;
    info!(code = %updated.code, "contribution rule deactivated");
    Ok(updated)
}

/// Loads the active rules in calculation order.
pub async fn active_rules<C: ConnectionTrait>(db: &C) -> Result<Vec<contribution::Model>> {
    Contribution::find()
        .filter(ContributionColumn::Active.eq(true))
        .order_by_asc(ContributionColumn::DisplayOrder)
        .order_by_asc(ContributionColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn rule_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<contribution::Model> {
    Contribution::find()
        .filter(ContributionColumn::Code.eq(code))
        .one(db)
        .await?
        .ok_or_else(|| Error::RuleNotFound {
            code: code.to_string(),
        })
}

#[allow(clippy::too_many_arguments)]
fn validate_rule_fields(
    code: &str,
    label: &str,
    employee_rate: Decimal,
    employer_rate: Decimal,
    base: ContributionBase,
    cap: Option<Decimal>,
    floor: Option<Decimal>,
    ceiling: Option<Decimal>,
) -> Result<()> {
    if label.trim().is_empty() {
        return Err(Error::Configuration {
            message: format!("rule '{code}' needs a label"),
        });
    }
    for (name, rate) in [("employee_rate", employee_rate), ("employer_rate", employer_rate)] {
        if rate < Decimal::ZERO || rate > dec!(100) {
            return Err(Error::Configuration {
                message: format!("{name} must be between 0 and 100, got {rate}"),
            });
        }
    }
    if base == ContributionBase::CappedGross && cap.is_none() {
        return Err(Error::Configuration {
            message: format!("rule '{code}' uses a capped base but sets no cap"),
        });
    }
    for (name, bound) in [("cap", cap), ("floor", floor), ("ceiling", ceiling)] {
        if let Some(bound) = bound {
            if bound < Decimal::ZERO {
                return Err(Error::Configuration {
                    message: format!("{name} cannot be negative, got {bound}"),
                });
            }
        }
    }
    if let (Some(floor), Some(ceiling)) = (floor, ceiling) {
        if floor > ceiling {
            return Err(Error::Configuration {
                message: format!("floor {floor} exceeds ceiling {ceiling}"),
            });
        }
    }
    Ok(())
}
